//! Error types for wildlens-id
//!
//! Every failure leaving a handler serializes as a flat `{"error": message}`
//! body: invalid requests as 400, everything else (upstream failures,
//! misconfiguration, internal errors) as 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::InsectIdError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Upstream identification service failure (500)
    #[error(transparent)]
    Upstream(#[from] InsectIdError),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_message_is_unwrapped() {
        let error = ApiError::BadRequest("No image provided".to_string());
        assert_eq!(error.to_string(), "No image provided");
    }

    #[test]
    fn test_upstream_error_passes_message_through() {
        let error = ApiError::from(InsectIdError::UploadFailed("Forbidden".to_string()));
        assert_eq!(error.to_string(), "Upload failed: Forbidden");
    }
}
