//! HTTP failure types
//!
//! Every failure leaving `ApiClient` is one of these variants. The value is
//! observed by the middleware chain and then handed back to the caller as-is.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: Value },

    /// Request was sent but no response came back
    #[error("Network error: {0}")]
    Network(String),

    /// Request could not be constructed (bad URL, bad header, unserializable body)
    #[error("Request build failed: {0}")]
    Build(String),

    /// Success status but the body did not decode into the expected type
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl HttpError {
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            HttpError::Status { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Server-provided message: `detail`, then `message`, when they are strings
    pub fn detail(&self) -> Option<String> {
        let body = self.body()?;
        body.get("detail")
            .and_then(Value::as_str)
            .or_else(|| body.get("message").and_then(Value::as_str))
            .map(str::to_string)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for HTTP operations
pub type HttpResult<T> = std::result::Result<T, HttpError>;
