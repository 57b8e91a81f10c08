//! Error types for prodomatix-review

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input (400); carries per-field messages
    #[error("Validation failed: {0:?}")]
    Validation(Vec<String>),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Syndication key header absent (401)
    #[error("Missing API key")]
    MissingApiKey,

    /// Syndication key matches no retailer (403)
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// prodomatix-common error
    #[error("Common error: {0}")]
    Common(#[from] prodomatix_common::Error),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Validation errors carry a field-error list in the body
        if let ApiError::Validation(errors) = self {
            let body = Json(json!({
                "error": {
                    "code": "VALIDATION_ERROR",
                    "message": "Invalid review submission",
                    "errors": errors,
                }
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let (status, error_code, message) = match self {
            ApiError::Validation(_) => unreachable!(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                "MISSING_API_KEY",
                "Missing API key".to_string(),
            ),
            ApiError::InvalidApiKey => (
                StatusCode::FORBIDDEN,
                "INVALID_API_KEY",
                "Invalid API key".to_string(),
            ),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Database(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                err.to_string(),
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
