use annex_core::{AnnexError, Status};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found (404)
    NotFound(String),

    /// Conflict - resource already exists (409)
    Conflict(String),

    /// Invalid input (400)
    BadRequest(String),

    /// No acceptable response media type (406)
    NotAcceptable(String),

    /// Unsupported request media type (415)
    UnsupportedMediaType(String),

    /// Method not allowed (405)
    MethodNotAllowed(String),

    /// Internal server error (500)
    Internal(String),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotAcceptable(msg) => (StatusCode::NOT_ACCEPTABLE, msg),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg),
            ApiError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(Status::failure(message, status.as_u16()));

        (status, body).into_response()
    }
}

impl From<AnnexError> for ApiError {
    fn from(err: AnnexError) -> Self {
        match err {
            // Parse failures are reported as not-found, never 400, so that
            // discovery clients probing unknown paths see the same answer as
            // for unregistered resources.
            AnnexError::MalformedPath { .. } => ApiError::NotFound(err.to_string()),
            AnnexError::NotAcceptable { .. } => ApiError::NotAcceptable(err.to_string()),
            AnnexError::DuplicateResource { .. } | AnnexError::SerializationError { .. } => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}
