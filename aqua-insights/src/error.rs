//! HTTP error mapping for aqua-insights
//!
//! Core failures keep their taxonomy on the wire: a transport failure is
//! "no data available for this view", a logic error is a conflict with the
//! current navigation state.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Operation not allowed in the current state (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote source unavailable (502)
    #[error("No data available: {0}")]
    NoData(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<aqua_common::Error> for ApiError {
    fn from(e: aqua_common::Error) -> Self {
        use aqua_common::Error;
        match e {
            Error::Transport(msg) => ApiError::NoData(msg),
            Error::Logic(msg) => ApiError::Conflict(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => {
                error!("Request rejected by navigation state: {}", msg);
                (StatusCode::CONFLICT, "CONFLICT", msg)
            }
            ApiError::NoData(msg) => (
                StatusCode::BAD_GATEWAY,
                "NO_DATA",
                format!("no data available for this view ({})", msg),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
