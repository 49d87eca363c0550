//! Error types for transport and hypermedia operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stable error codes for failures that carry no server-supplied code.
pub mod error_codes {
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const CANCELLED: &str = "CANCELLED";
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const LINK_NOT_FOUND: &str = "LINK_NOT_FOUND";
}

/// Status reported for failures that never produced an HTTP response.
pub const STATUS_NO_RESPONSE: u16 = 0;

/// Status reported for client-side timeouts.
pub const STATUS_TIMEOUT: u16 = 408;

/// All errors a request through this crate can fail with.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (DNS, connection refused, TLS, ...).
    #[error("Network error: {message}")]
    Network { message: String },

    /// The configured timeout elapsed and the request was aborted.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Non-2xx response, with a parsed or synthesized error body.
    #[error("HTTP {status} {code}: {message}")]
    Http {
        status: u16,
        code: String,
        message: String,
        details: Option<Value>,
    },

    /// The caller cancelled the request through its [`CancelToken`](crate::transport::CancelToken).
    #[error("Request cancelled")]
    Cancelled,

    /// A 2xx response whose body is not a JSON object.
    #[error("Invalid response (HTTP {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Link not found: {0}")]
    LinkNotFound(String),
}

impl ClientError {
    /// Numeric status: the HTTP status, 408 for timeouts, 0 when nothing came back.
    pub fn status(&self) -> u16 {
        match self {
            ClientError::Http { status, .. } | ClientError::InvalidResponse { status, .. } => {
                *status
            }
            ClientError::Timeout { .. } => STATUS_TIMEOUT,
            ClientError::Network { .. }
            | ClientError::Cancelled
            | ClientError::InvalidRequest(_)
            | ClientError::LinkNotFound(_) => STATUS_NO_RESPONSE,
        }
    }

    /// Machine-readable code for rendering.
    pub fn code(&self) -> &str {
        use error_codes::*;
        match self {
            ClientError::Network { .. } => NETWORK_ERROR,
            ClientError::Timeout { .. } => TIMEOUT,
            ClientError::Http { code, .. } => code.as_str(),
            ClientError::Cancelled => CANCELLED,
            ClientError::InvalidResponse { .. } => INVALID_RESPONSE,
            ClientError::InvalidRequest(_) => INVALID_REQUEST,
            ClientError::LinkNotFound(_) => LINK_NOT_FOUND,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Http { status: 401, .. })
    }

    /// Build an HTTP error from a response body, falling back to the status line.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ClientError::Http {
                status,
                code: envelope.error.code,
                message: envelope.error.message,
                details: envelope.error.details,
            },
            Err(_) => ClientError::Http {
                status,
                code: format!("HTTP_{status}"),
                message: status_text(status),
                details: None,
            },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Network {
            message: e.to_string(),
        }
    }
}

/// Structured error body sent by the server on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Convenience result type.
pub type ClientResult<T> = Result<T, ClientError>;
