//! Error types for manifest source operations.

use serde_json::Value;

/// Result type for manifest source operations.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Errors raised while talking to a manifest source.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The external API answered with a non-success status.
    ///
    /// `message` and `details` are taken from the response body and are
    /// forwarded to the client unchanged.
    #[error("upstream returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        details: Option<Value>,
    },

    /// Transport failure: connection refused, timeout, TLS.
    #[error("network error: {message}")]
    Network { message: String },

    /// The body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Unknown manifest id.
    #[error("manifest not found: {id}")]
    NotFound { id: String },

    /// Missing or malformed request parameters.
    #[error("bad request: {message}")]
    BadRequest { message: String },

    /// Configuration or initialization error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl UpstreamError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Build a status error from a non-success response body.
    ///
    /// The message is the body's `message`, else `errors[0].message`, else
    /// `fallback` (usually the canonical reason phrase).
    pub fn from_status_body(status: u16, body: Option<Value>, fallback: &str) -> Self {
        let message = body
            .as_ref()
            .and_then(|b| {
                b.get("message")
                    .and_then(Value::as_str)
                    .or_else(|| {
                        b.get("errors")
                            .and_then(|e| e.get(0))
                            .and_then(|e| e.get("message"))
                            .and_then(Value::as_str)
                    })
                    .filter(|m| !m.is_empty())
            })
            .map(str::to_string)
            .unwrap_or_else(|| fallback.to_string());

        Self::Status {
            status,
            message,
            details: body,
        }
    }

    /// HTTP status a handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Status { status, .. } => *status,
            Self::NotFound { .. } => 404,
            Self::BadRequest { .. } => 400,
            Self::Network { .. } | Self::InvalidResponse { .. } | Self::Config { .. } => 500,
        }
    }
}
