//! Error responses in the backend's `{"success": false, "error": ...}` shape.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Handler error for the mock backend.
#[derive(Debug, Error)]
pub enum MockError {
    /// Missing, unknown or rejected bearer token.
    #[error("Authentication required")]
    Unauthorized,

    /// Login with wrong username or password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Malformed or out-of-range input.
    #[error("{0}")]
    BadRequest(String),

    /// Referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Failure produced by an armed fault.
    #[error("{0}")]
    Injected(&'static str),
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Injected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if matches!(self, Self::Injected(_)) {
            tracing::warn!(error = %self, "Injected failure");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = json!({ "success": false, "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `MockError`.
pub type Result<T> = std::result::Result<T, MockError>;
