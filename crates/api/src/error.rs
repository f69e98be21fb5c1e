//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::CommandError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Command pipeline error.
    Command(CommandError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Command(err) => command_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn command_error_to_response(err: CommandError) -> (StatusCode, String) {
    match &err {
        CommandError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        CommandError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        CommandError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        CommandError::Persistence(_) => {
            tracing::error!(error = %err, "command failed to persist");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to persist changes".to_string(),
            )
        }
    }
}

impl From<CommandError> for ApiError {
    fn from(err: CommandError) -> Self {
        ApiError::Command(err)
    }
}
