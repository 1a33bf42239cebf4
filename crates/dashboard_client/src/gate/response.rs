use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;

pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Decoded response payload, tagged by the server's content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Text(text) => Some(text),
        }
    }

    /// Collapse into a JSON value; text bodies become a JSON string.
    pub fn into_json(self) -> Value {
        match self {
            ResponseBody::Json(value) => value,
            ResponseBody::Text(text) => Value::String(text),
        }
    }

    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.into_json())?)
    }

    /// The human-readable error the server sent, from `message` or `detail`.
    pub fn server_message(&self) -> Option<String> {
        let value = self.as_json()?;
        ["message", "detail"].iter().find_map(|key| match value.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        })
    }

    /// Parse `bytes` as JSON when `content_type` says so, otherwise as text.
    pub fn parse(content_type: Option<&str>, bytes: &[u8]) -> Result<Self, ApiError> {
        let is_json = content_type
            .map(|ct| ct.to_ascii_lowercase().contains("application/json"))
            .unwrap_or(false);

        if is_json {
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(ResponseBody::Json(Value::Null));
            }
            Ok(ResponseBody::Json(serde_json::from_slice(bytes)?))
        } else {
            Ok(ResponseBody::Text(String::from_utf8_lossy(bytes).into_owned()))
        }
    }
}

pub(crate) async fn read_body(response: Response) -> Result<(StatusCode, ResponseBody), ApiError> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;

    let body = match ResponseBody::parse(content_type.as_deref(), &bytes) {
        Ok(body) => body,
        // Proxy error pages often claim JSON; keep the status and fall back to text.
        Err(e) if !status.is_success() => {
            debug!(status = %status, error = %e, "error body is not valid JSON");
            ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        Err(e) => return Err(e),
    };
    Ok((status, body))
}

/// Decode the body and turn a non-2xx status into `ApiError::Api`.
pub(crate) async fn into_result(response: Response) -> Result<ResponseBody, ApiError> {
    let (status, body) = read_body(response).await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(api_error(status, body))
    }
}

pub(crate) fn api_error(status: StatusCode, body: ResponseBody) -> ApiError {
    let message = body
        .server_message()
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    ApiError::Api {
        status,
        message,
        body,
    }
}
