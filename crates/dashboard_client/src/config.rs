use std::path::PathBuf;
use url::Url;

use crate::auth::token_store;
use crate::error::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://oplueaswsapi.pythonanywhere.com/api";
pub const REFRESH_PATH: &str = "/token/refresh/";

pub const ENV_BASE_URL: &str = "DASHBOARD_API_URL";
pub const ENV_TOKEN_FILE: &str = "DASHBOARD_TOKEN_FILE";

/// Where the API lives and where the session is kept.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://host/api`. Request paths are appended verbatim.
    pub base_url: Url,
    /// Token file; `None` keeps the session in memory only.
    pub token_path: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            token_path: None,
        })
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = Some(path.into());
        self
    }

    /// Build from `DASHBOARD_API_URL` and `DASHBOARD_TOKEN_FILE`.
    ///
    /// Falls back to the production API and `~/.interiors_dashboard/tokens.json`.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let token_path = match std::env::var(ENV_TOKEN_FILE) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => token_store::default_path()?,
        };

        Ok(Self::new(&base_url)?.with_token_path(token_path))
    }

    /// Absolute URL for an API path such as `/invoices/12/`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidPath(path.to_string()));
        }
        let joined = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&joined).map_err(|e| ApiError::InvalidPath(format!("{path}: {e}")))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidPath(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ApiError::InvalidPath(format!(
            "{raw}: base URL must be http or https"
        )));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_endpoint_appends_path() {
        let config = ClientConfig::new("http://127.0.0.1:8000/api").unwrap();
        assert_eq!(
            config.endpoint("/invoices/7/").unwrap().as_str(),
            "http://127.0.0.1:8000/api/invoices/7/"
        );
    }

    #[test]
    fn test_endpoint_tolerates_trailing_slash_and_query() {
        let config = ClientConfig::new("https://example.com/api/").unwrap();
        assert_eq!(
            config.endpoint("/quotes/admin/?status=pending").unwrap().as_str(),
            "https://example.com/api/quotes/admin/?status=pending"
        );
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let config = ClientConfig::new("https://example.com/api").unwrap();
        assert!(matches!(
            config.endpoint("invoices/"),
            Err(ApiError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_non_http_base_is_rejected() {
        assert!(ClientConfig::new("ftp://example.com").is_err());
        assert!(ClientConfig::new("not a url").is_err());
    }
}
