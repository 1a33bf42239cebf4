use reqwest::StatusCode;
use thiserror::Error;

use crate::gate::ResponseBody;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced to callers of the gate and the resource clients.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        body: ResponseBody,
    },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Invalid request path: {0}")]
    InvalidPath(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// True when the session is gone and the user has to sign in again.
    ///
    /// An abandoned refresh leaves the stored tokens untouched, so it does
    /// not count.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, ApiError::Auth(e) if *e != AuthError::RefreshAbandoned)
    }
}

/// Terminal refresh failures.
///
/// Cloneable so that a single failed refresh can reject every request that
/// queued up behind it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Token refresh failed: {status} - {message}")]
    RefreshRejected { status: u16, message: String },

    #[error("Token refresh failed: {0}")]
    RefreshTransport(String),

    #[error("Token refresh response was malformed: {0}")]
    MalformedRefresh(String),

    #[error("Token refresh was abandoned before it completed")]
    RefreshAbandoned,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Token file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Could not determine home directory for token storage")]
    NoHomeDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_only_for_terminal_auth_failures() {
        assert!(ApiError::from(AuthError::MissingRefreshToken).is_session_expired());
        assert!(ApiError::from(AuthError::RefreshRejected {
            status: 401,
            message: "Token is blacklisted".to_string(),
        })
        .is_session_expired());
        assert!(ApiError::from(AuthError::MalformedRefresh("missing access".to_string())).is_session_expired());

        assert!(!ApiError::from(AuthError::RefreshAbandoned).is_session_expired());
        assert!(!ApiError::InvalidPath("invoices".to_string()).is_session_expired());
    }
}
