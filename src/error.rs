use crate::types::{extract_rate, RateMeta};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of failure kinds for anything that went over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    MethodNotAllowed,
    RateLimit,
    Api,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => ErrorKind::BadRequest,
            StatusCode::UNAUTHORIZED => ErrorKind::Unauthorized,
            StatusCode::NOT_FOUND => ErrorKind::NotFound,
            StatusCode::METHOD_NOT_ALLOWED => ErrorKind::MethodNotAllowed,
            StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimit,
            _ => ErrorKind::Api,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::RateLimit => "rate_limited",
            ErrorKind::Api => "api_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failed exchange with the API: what kind, what the server said, and the raw response.
#[derive(Debug, Clone, Error)]
#[error("{kind}{}: {}", status_suffix(.status), .message.as_deref().unwrap_or("no message"))]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: Option<String>,
    pub status: Option<StatusCode>,
    pub body: Option<String>,
    pub headers: HeaderMap,
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    status
        .map(|s| format!(" ({})", s.as_u16()))
        .unwrap_or_default()
}

impl ApiError {
    pub fn missing_api_key() -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            message: Some(
                "No API key provided (set Config::api_key or the ADYO_API_KEY env var)".into(),
            ),
            status: None,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Failure below HTTP (refused connection, DNS, timeout). Status defaults to 500.
    pub fn transport(message: impl Into<String>, status: Option<StatusCode>) -> Self {
        Self {
            kind: ErrorKind::Api,
            message: Some(message.into()),
            status: Some(status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Body could not be decoded as JSON, whatever the status was.
    pub fn invalid_body(
        cause: &serde_json::Error,
        status: StatusCode,
        body: String,
        headers: HeaderMap,
    ) -> Self {
        Self {
            kind: ErrorKind::Api,
            message: Some(format!(
                "Invalid response body from API: {} (HTTP response code: {})",
                cause,
                status.as_u16()
            )),
            status: Some(status),
            body: Some(body),
            headers,
        }
    }

    pub fn from_response(
        status: StatusCode,
        decoded: &Value,
        body: String,
        headers: HeaderMap,
    ) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            message: extract_error_message(decoded),
            status: Some(status),
            body: Some(body),
            headers,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status.map(|s| s.as_u16())
    }

    pub fn rate(&self) -> RateMeta {
        extract_rate(&self.headers)
    }
}

/// `error` wins over `errors`; a list of messages is joined with `.`.
pub fn extract_error_message(decoded: &Value) -> Option<String> {
    match decoded.get("error") {
        Some(Value::String(s)) => return Some(s.clone()),
        Some(Value::Null) | None => {}
        Some(other) => return Some(other.to_string()),
    }
    let errors = decoded.get("errors")?.as_array()?;
    let parts: Vec<String> = errors
        .iter()
        .map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    Some(parts.join("."))
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{resource} has no id; create or retrieve it first")]
    MissingId { resource: &'static str },

    #[error("{resource} {id} has already been deleted")]
    Deleted { resource: &'static str, id: String },

    #[error("`{attribute}` is not a writable attribute of {resource}")]
    InvalidAttribute {
        resource: &'static str,
        attribute: String,
    },

    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },

    #[error("cannot open upload file {}: {source}", .path.display())]
    Upload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
}

impl Error {
    /// Kind of the underlying API failure; `None` for local errors.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Api(e) => Some(e.kind),
            _ => None,
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_mapping_matrix() {
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_REQUEST), ErrorKind::BadRequest);
        assert_eq!(ErrorKind::from_status(StatusCode::UNAUTHORIZED), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from_status(StatusCode::METHOD_NOT_ALLOWED),
            ErrorKind::MethodNotAllowed
        );
        assert_eq!(ErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS), ErrorKind::RateLimit);
        assert_eq!(ErrorKind::from_status(StatusCode::FORBIDDEN), ErrorKind::Api);
        assert_eq!(ErrorKind::from_status(StatusCode::CONFLICT), ErrorKind::Api);
        assert_eq!(ErrorKind::from_status(StatusCode::INTERNAL_SERVER_ERROR), ErrorKind::Api);
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_GATEWAY), ErrorKind::Api);
    }

    #[test]
    fn message_precedence() {
        assert_eq!(
            extract_error_message(&json!({"error": "Bad", "errors": ["a", "b"]})).as_deref(),
            Some("Bad")
        );
        assert_eq!(
            extract_error_message(&json!({"errors": ["Name is required", "Width is required"]}))
                .as_deref(),
            Some("Name is required.Width is required")
        );
        assert_eq!(extract_error_message(&json!({"errors": "not a list"})), None);
        assert_eq!(extract_error_message(&json!({"message": "ignored"})), None);
        assert_eq!(extract_error_message(&json!([1, 2])), None);
    }

    #[test]
    fn transport_error_defaults_to_500() {
        let e = ApiError::transport("connection refused", None);
        assert_eq!(e.kind, ErrorKind::Api);
        assert_eq!(e.status_code(), Some(500));
        assert_eq!(e.to_string(), "api_error (500): connection refused");
    }

    #[test]
    fn missing_key_is_unauthorized_without_status() {
        let e = Error::from(ApiError::missing_api_key());
        assert_eq!(e.kind(), Some(ErrorKind::Unauthorized));
        assert_eq!(e.as_api().and_then(|a| a.status_code()), None);
    }
}
