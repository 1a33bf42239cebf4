use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::auth::TokenPair;
use crate::error::Result;
use crate::gate::{RequestGate, RequestOptions};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Body of a successful `/auth/login/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<Value>,
}

pub struct AuthApi<'a> {
    gate: &'a RequestGate,
}

impl<'a> AuthApi<'a> {
    pub fn new(gate: &'a RequestGate) -> Self {
        Self { gate }
    }

    /// Exchange credentials for a token pair and start the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let options = RequestOptions::post()
            .json(&LoginRequest { email, password })?
            .skip_auth();
        let response: LoginResponse = self.gate.request("/auth/login/", options).await?.deserialize()?;

        self.gate
            .sign_in(TokenPair::new(response.access.clone(), response.refresh.clone()))?;
        info!("signed in");
        Ok(response)
    }

    pub async fn register<B: Serialize + ?Sized>(&self, user: &B) -> Result<Value> {
        let options = RequestOptions::post().json(user)?.skip_auth();
        Ok(self.gate.request("/auth/register/", options).await?.into_json())
    }

    pub fn logout(&self) {
        self.gate.sign_out();
        info!("signed out");
    }

    pub async fn profile<T: DeserializeOwned>(&self) -> Result<T> {
        self.gate.get("/auth/profile/").await?.deserialize()
    }

    pub async fn update_profile<B, T>(&self, profile: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.gate.put("/auth/profile/update/", profile).await?.deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{SessionState, TokenStore};
    use crate::config::ClientConfig;
    use crate::resources::test_support::signed_in_gate;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[tokio::test]
    async fn test_login_stores_tokens_and_signs_in() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/auth/login/")
            .match_header("authorization", Matcher::Missing)
            .match_body(Matcher::Json(json!({"email": "admin@example.com", "password": "pw"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access": "A1", "refresh": "R1", "user": {"email": "admin@example.com"}}"#)
            .create_async()
            .await;

        let gate = RequestGate::new(ClientConfig::new(&server.url()).unwrap(), TokenStore::in_memory());
        assert_eq!(gate.session().current(), SessionState::SignedOut);

        let response = AuthApi::new(&gate).login("admin@example.com", "pw").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.user, Some(json!({"email": "admin@example.com"})));
        assert_eq!(gate.tokens().get(), Some(TokenPair::new("A1", "R1")));
        assert_eq!(gate.session().current(), SessionState::SignedIn);
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_alone() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/auth/login/")
            .with_status(401)
            .with_header("content-type", "application/json")
            .with_body(r#"{"detail": "No active account found with the given credentials"}"#)
            .create_async()
            .await;

        let gate = RequestGate::new(ClientConfig::new(&server.url()).unwrap(), TokenStore::in_memory());
        let err = AuthApi::new(&gate).login("a@b.c", "bad").await.unwrap_err();

        assert_eq!(err.to_string(), "No active account found with the given credentials");
        assert!(!gate.tokens().is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_clears_tokens() {
        let server = Server::new_async().await;
        let gate = signed_in_gate(&server);

        AuthApi::new(&gate).logout();

        assert!(!gate.tokens().is_authenticated());
        assert_eq!(gate.session().current(), SessionState::SignedOut);
    }

    #[tokio::test]
    async fn test_profile_update_uses_put() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/auth/profile/update/")
            .match_header("authorization", "Bearer A1")
            .match_body(Matcher::Json(json!({"first_name": "Ada"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"first_name": "Ada"}"#)
            .create_async()
            .await;

        let gate = signed_in_gate(&server);
        let profile: Value = AuthApi::new(&gate)
            .update_profile(&json!({"first_name": "Ada"}))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(profile["first_name"], "Ada");
    }
}
