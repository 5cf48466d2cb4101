//! Error types for the map orchestrator
//!
//! Provides unified error handling using thiserror.
//!
//! Superseded operations are not errors; they surface as outcome variants
//! (`Resolution::Superseded`, `RefreshOutcome::Superseded`, ...).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Geo Error Enum ==
/// Unified error type for the orchestrator and its service adapters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// Upstream service unreachable or answered with a non-2xx status
    #[error("Service unavailable: {0}")]
    NetworkUnavailable(String),

    /// Upstream answered 429
    #[error("Too many requests, please wait a moment")]
    RateLimited,

    /// Local deadline exceeded
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Well-formed but empty result
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or unexpected payload
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GeoError::Timeout(err.to_string())
        } else if err.is_decode() {
            GeoError::ParseFailure(err.to_string())
        } else {
            GeoError::NetworkUnavailable(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for GeoError {
    fn into_response(self) -> Response {
        let status = match &self {
            GeoError::NetworkUnavailable(_) => StatusCode::BAD_GATEWAY,
            GeoError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GeoError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GeoError::NotFound(_) => StatusCode::NOT_FOUND,
            GeoError::ParseFailure(_) => StatusCode::BAD_GATEWAY,
            GeoError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the orchestrator.
pub type Result<T> = std::result::Result<T, GeoError>;
