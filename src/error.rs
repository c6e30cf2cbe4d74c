//! Error types for the aggregation server
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Upstream Error Enum ==
/// Failure talking to, or decoding a response from, the upstream API.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Transport-level failure
    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Configured base URL cannot have endpoint paths appended
    #[error("Invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),

    /// Auth token cannot be sent as a header value
    #[error("Auth token is not a valid header value")]
    InvalidToken,

    /// Call exceeded the configured timeout
    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("Upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Body was not valid JSON
    #[error("Upstream returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// JSON did not have the expected envelope
    #[error("Upstream returned an {0}")]
    InvalidShape(String),

    /// One or more per-user fetches failed during fan-out
    #[error("Upstream fan-out failed for ids: {}", failed.join(", "))]
    FanOut { failed: Vec<String> },
}

// == API Error Enum ==
/// Error surfaced to HTTP callers.
///
/// Upstream failures carry only a generic message; the underlying cause is
/// logged, never returned.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed query parameter
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Upstream data could not be produced and no fallback applied
    #[error("{0}")]
    Upstream(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for upstream-facing code.
pub type Result<T> = std::result::Result<T, UpstreamError>;
