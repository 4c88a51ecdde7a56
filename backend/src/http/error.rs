//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::ChartSpecError;
use crate::upstream::UpstreamError;

/// API error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// Manifest source error
    Upstream(UpstreamError),
    /// Chart specification rejected
    Chart(ChartSpecError),
}

impl AppError {
    fn parts(self) -> (StatusCode, ApiError) {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Chart(e) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("INVALID_CHART_SPEC", e.to_string()),
            ),
            AppError::Upstream(e) => {
                let status = StatusCode::from_u16(e.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                match e {
                    UpstreamError::Status {
                        message, details, ..
                    } => {
                        let mut error = ApiError::new("UPSTREAM_ERROR", message);
                        if let Some(details) = details {
                            error = error.with_details(details);
                        }
                        (status, error)
                    }
                    UpstreamError::NotFound { .. } => {
                        (status, ApiError::new("NOT_FOUND", e.to_string()))
                    }
                    UpstreamError::BadRequest { message } => {
                        (status, ApiError::new("BAD_REQUEST", message))
                    }
                    other => (status, ApiError::new("UPSTREAM_UNAVAILABLE", other.to_string())),
                }
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        if status.is_server_error() {
            tracing::error!(code = %error.code, "{}", error.message);
        }
        (status, Json(error)).into_response()
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<ChartSpecError> for AppError {
    fn from(err: ChartSpecError) -> Self {
        AppError::Chart(err)
    }
}
