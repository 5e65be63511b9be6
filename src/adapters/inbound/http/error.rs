use axum::{Json, http::StatusCode};
use tracing::error;

use super::dto::ErrorResponseDto;
use crate::domain::errors::{DriveError, ErrorKind};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponseDto>);

impl From<&DriveError> for StatusCode {
    fn from(err: &DriveError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::NameConflict => StatusCode::CONFLICT,
            ErrorKind::TooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::InvalidMethod
            | ErrorKind::MismatchedResource
            | ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::AccessDenied => StatusCode::FORBIDDEN,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Map a service error to its status code and a client-safe body
pub fn api_error(err: DriveError) -> ApiError {
    if err.is_internal() {
        error!(error = %err, "request failed");
    }
    (
        StatusCode::from(&err),
        Json(ErrorResponseDto::from_drive_error(&err)),
    )
}

pub fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponseDto::bad_request(message)),
    )
}
