use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// One field of a multipart upload.
#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Bytes,
    },
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file_name.into(),
                mime: mime.map(str::to_string),
                bytes: bytes.into(),
            },
        }
    }
}

/// Request payload.
///
/// Kept as plain data rather than a built `reqwest` body so the request can be
/// replayed after a token refresh.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormField>),
}

impl RequestBody {
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        Ok(RequestBody::Json(serde_json::to_value(value)?))
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Attach the body. Everything except multipart goes out as JSON.
    pub(crate) fn apply(&self, builder: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let builder = match self {
            RequestBody::Empty => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => builder.multipart(build_form(fields)?),
        };
        Ok(builder)
    }
}

fn build_form(fields: &[FormField]) -> Result<Form, ApiError> {
    let mut form = Form::new();
    for field in fields {
        form = match &field.value {
            FormValue::Text(text) => form.text(field.name.clone(), text.clone()),
            FormValue::File {
                file_name,
                mime,
                bytes,
            } => {
                let mut part = Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    part = part.mime_str(mime)?;
                }
                form.part(field.name.clone(), part)
            }
        };
    }
    Ok(form)
}

/// Per-call options.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: RequestBody,
    /// Omit the bearer header and never attempt a refresh (login, register).
    pub skip_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: RequestBody::Empty,
            skip_auth: false,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn patch() -> Self {
        Self::new(Method::PATCH)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, ApiError> {
        Ok(self.body(RequestBody::json(value)?))
    }

    pub fn multipart(self, fields: Vec<FormField>) -> Self {
        self.body(RequestBody::Multipart(fields))
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_authenticated_get() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(!options.skip_auth);
        assert!(matches!(options.body, RequestBody::Empty));
    }

    #[test]
    fn test_builder_sets_body_and_skip_auth() {
        let options = RequestOptions::post()
            .json(&json!({"email": "a@b.c"}))
            .unwrap()
            .skip_auth();

        assert!(options.skip_auth);
        match options.body {
            RequestBody::Json(value) => assert_eq!(value["email"], "a@b.c"),
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_multipart_form_builds_every_attempt() {
        let body = RequestBody::Multipart(vec![
            FormField::text("title", "Living room"),
            FormField::file("image", "room.png", Some("image/png"), vec![1u8, 2, 3]),
        ]);
        assert!(body.is_multipart());

        let RequestBody::Multipart(fields) = &body else {
            unreachable!()
        };
        assert!(build_form(fields).is_ok());
        assert!(build_form(fields).is_ok());
    }

    #[test]
    fn test_bad_mime_is_rejected() {
        let fields = vec![FormField::file("f", "x.bin", Some("not a mime"), vec![0u8])];
        assert!(build_form(&fields).is_err());
    }
}
