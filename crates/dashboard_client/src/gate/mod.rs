//! Authenticated request gate.
//!
//! Every API call goes through [`RequestGate`]. It attaches the bearer token,
//! and when the server answers 401 it exchanges the refresh token for a new
//! pair and replays the call once. Concurrent 401s share a single refresh:
//! the first caller performs it, later callers park on a one-shot channel and
//! are released in arrival order when it settles.

pub mod request;
pub mod response;

pub use request::{FormField, FormValue, RequestBody, RequestOptions};
pub use response::ResponseBody;

use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::auth::{SessionSignal, SessionState, TokenPair, TokenStore};
use crate::config::{ClientConfig, REFRESH_PATH};
use crate::error::{ApiError, AuthError, Result};

type Waiter = oneshot::Sender<std::result::Result<String, AuthError>>;

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    pending: VecDeque<Waiter>,
}

enum Turn {
    /// This caller runs the refresh.
    Leader,
    /// A refresh is already running; wait for its outcome.
    Follower(oneshot::Receiver<std::result::Result<String, AuthError>>),
    /// The token that was rejected has already been replaced.
    AlreadyRefreshed(String),
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access: String,
    // Rotation is optional; keep the old refresh token when none is returned.
    #[serde(default)]
    refresh: Option<String>,
}

/// Clears the in-flight flag and releases waiters even if the refreshing
/// future is dropped part way through.
struct RefreshLeader<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl RefreshLeader<'_> {
    fn take_waiters(&self) -> VecDeque<Waiter> {
        let mut state = self.state.lock();
        state.in_flight = false;
        std::mem::take(&mut state.pending)
    }

    fn settle(mut self, outcome: &std::result::Result<String, AuthError>) {
        self.settled = true;
        let waiters = self.take_waiters();
        if !waiters.is_empty() {
            debug!(waiters = waiters.len(), ok = outcome.is_ok(), "releasing queued requests");
        }
        for waiter in waiters {
            // A waiter that went away has nothing left to replay.
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RefreshLeader<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("token refresh dropped before completing");
            // Dropping the senders wakes every waiter with RefreshAbandoned.
            drop(self.take_waiters());
        }
    }
}

/// The single entry point for talking to the dashboard API.
///
/// Construct once per process and share by reference or `Arc`.
pub struct RequestGate {
    http: reqwest::Client,
    config: ClientConfig,
    tokens: TokenStore,
    session: SessionSignal,
    refresh: Mutex<RefreshState>,
}

impl RequestGate {
    pub fn new(config: ClientConfig, tokens: TokenStore) -> Self {
        Self::with_http_client(config, tokens, reqwest::Client::new())
    }

    pub fn with_http_client(config: ClientConfig, tokens: TokenStore, http: reqwest::Client) -> Self {
        let initial = if tokens.is_authenticated() {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        };

        Self {
            http,
            config,
            tokens,
            session: SessionSignal::new(initial),
            refresh: Mutex::new(RefreshState::default()),
        }
    }

    /// Open the configured token file (or an in-memory store) and build a gate.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let tokens = match &config.token_path {
            Some(path) => TokenStore::new(path.clone())?,
            None => TokenStore::in_memory(),
        };
        Ok(Self::new(config, tokens))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn session(&self) -> &SessionSignal {
        &self.session
    }

    pub fn subscribe_session(&self) -> watch::Receiver<SessionState> {
        self.session.subscribe()
    }

    /// Send a request and decode its body.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ResponseBody> {
        let resp = self.send_authorized(path, &options).await?;
        response::into_result(resp).await
    }

    /// GET raw bytes (PDF exports and other binary downloads).
    pub async fn download(&self, path: &str) -> Result<Bytes> {
        let resp = self.send_authorized(path, &RequestOptions::get()).await?;
        if !resp.status().is_success() {
            let (status, body) = response::read_body(resp).await?;
            return Err(response::api_error(status, body));
        }
        Ok(resp.bytes().await?)
    }

    pub async fn get(&self, path: &str) -> Result<ResponseBody> {
        self.request(path, RequestOptions::get()).await
    }

    pub async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseBody> {
        self.request(path, RequestOptions::post().json(body)?).await
    }

    pub async fn put<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseBody> {
        self.request(path, RequestOptions::put().json(body)?).await
    }

    pub async fn patch<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<ResponseBody> {
        self.request(path, RequestOptions::patch().json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ResponseBody> {
        self.request(path, RequestOptions::delete()).await
    }

    /// Store a freshly issued pair (after login) and mark the session live.
    pub fn sign_in(&self, pair: TokenPair) -> Result<()> {
        let stored = self.tokens.set(pair);
        self.session.signed_in();
        Ok(stored?)
    }

    /// Drop the session and tell listeners to show the login screen.
    pub fn sign_out(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "failed to remove persisted tokens");
        }
        self.session.signed_out();
    }

    async fn send_authorized(&self, path: &str, options: &RequestOptions) -> Result<Response> {
        let url = self.config.endpoint(path)?;
        let sent_token = if options.skip_auth {
            None
        } else {
            self.tokens.access_token()
        };

        let response = self.send(&url, options, sent_token.as_deref()).await?;
        if options.skip_auth || response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(method = %options.method, path, "unauthorized, refreshing access token");
        let access = self.fresh_access_token(sent_token.as_deref()).await?;

        // One replay per call. A second 401 is reported as an ordinary API error.
        debug!(method = %options.method, path, "replaying request with refreshed token");
        self.send(&url, options, Some(access.as_str())).await
    }

    async fn send(&self, url: &Url, options: &RequestOptions, token: Option<&str>) -> Result<Response> {
        let mut builder = self.http.request(options.method.clone(), url.clone());
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let builder = options.body.apply(builder)?;

        builder.send().await.map_err(|e| {
            warn!(method = %options.method, url = %url, error = %e, "request failed to reach server");
            ApiError::Transport(e)
        })
    }

    /// Obtain an access token newer than `rejected`, refreshing at most once
    /// across all concurrent callers.
    async fn fresh_access_token(&self, rejected: Option<&str>) -> std::result::Result<String, AuthError> {
        let turn = {
            let mut state = self.refresh.lock();
            if state.in_flight {
                let (tx, rx) = oneshot::channel();
                state.pending.push_back(tx);
                Turn::Follower(rx)
            } else {
                match self.tokens.access_token() {
                    Some(current) if rejected != Some(current.as_str()) => Turn::AlreadyRefreshed(current),
                    _ => {
                        state.in_flight = true;
                        Turn::Leader
                    }
                }
            }
        };

        match turn {
            Turn::AlreadyRefreshed(access) => Ok(access),
            Turn::Follower(rx) => rx.await.unwrap_or(Err(AuthError::RefreshAbandoned)),
            Turn::Leader => {
                let leader = RefreshLeader {
                    state: &self.refresh,
                    settled: false,
                };
                let outcome = self.refresh_tokens().await;
                leader.settle(&outcome);
                outcome
            }
        }
    }

    async fn refresh_tokens(&self) -> std::result::Result<String, AuthError> {
        let Some(refresh) = self.tokens.refresh_token() else {
            warn!("no refresh token stored, ending session");
            self.sign_out();
            return Err(AuthError::MissingRefreshToken);
        };

        match self.exchange_refresh_token(&refresh).await {
            Ok(pair) => {
                let access = pair.access.clone();
                if let Err(e) = self.tokens.set(pair) {
                    warn!(error = %e, "refreshed tokens could not be persisted");
                }
                self.session.signed_in();
                info!("access token refreshed");
                Ok(access)
            }
            Err(e) => {
                error!(error = %e, "token refresh failed, ending session");
                self.sign_out();
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh: &str) -> std::result::Result<TokenPair, AuthError> {
        let url = self
            .config
            .endpoint(REFRESH_PATH)
            .map_err(|e| AuthError::RefreshTransport(e.to_string()))?;

        let response = self
            .http
            .post(url)
            .json(&RefreshRequest { refresh })
            .send()
            .await
            .map_err(|e| AuthError::RefreshTransport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::RefreshTransport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .map(ResponseBody::Json)
                .and_then(|body| body.server_message())
                .unwrap_or_else(|| "Token refresh failed".to_string());
            return Err(AuthError::RefreshRejected {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RefreshResponse =
            serde_json::from_str(&text).map_err(|e| AuthError::MalformedRefresh(e.to_string()))?;
        if parsed.access.is_empty() {
            return Err(AuthError::MalformedRefresh("empty access token".to_string()));
        }

        let refresh = parsed
            .refresh
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| refresh.to_string());
        Ok(TokenPair::new(parsed.access, refresh))
    }
}

impl std::fmt::Debug for RequestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestGate")
            .field("base_url", &self.config.base_url.as_str())
            .field("tokens", &self.tokens)
            .field("session", &self.session.current())
            .finish()
    }
}
