use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, request::Parts},
};
use uuid::Uuid;

use super::{dto::ErrorResponseDto, error::ApiError};
use crate::domain::models::Principal;

/// Identity headers set by the authenticating gateway
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ADMIN_HEADER: &str = "x-user-admin";

/// Declared payload size for streamed uploads
pub const FILE_SIZE_HEADER: &str = "x-file-size";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Read the caller identity from request headers
///
/// The gateway is trusted; a missing or malformed user id is a 401.
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, ApiError> {
    let unauthorized = |message: &str| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponseDto::unauthorized(message)),
        )
    };

    let raw = header_str(headers, USER_ID_HEADER)
        .ok_or_else(|| unauthorized("missing x-user-id header"))?;
    let user_id = Uuid::parse_str(raw).map_err(|_| unauthorized("malformed x-user-id header"))?;

    let is_admin = header_str(headers, USER_ADMIN_HEADER)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false);

    Ok(Principal {
        user_id,
        email: header_str(headers, USER_EMAIL_HEADER).map(str::to_string),
        is_admin,
    })
}

/// Declared size from `x-file-size`, 0 when absent or unparsable
pub fn declared_size(headers: &HeaderMap) -> u64 {
    header_str(headers, FILE_SIZE_HEADER)
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from_headers(&parts.headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_principal_from_headers() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers.insert(USER_EMAIL_HEADER, HeaderValue::from_static("a@example.com"));
        headers.insert(USER_ADMIN_HEADER, HeaderValue::from_static("TRUE"));

        let principal = principal_from_headers(&headers).unwrap();
        assert_eq!(principal.user_id, id);
        assert_eq!(principal.email.as_deref(), Some("a@example.com"));
        assert!(principal.is_admin);
    }

    #[test]
    fn test_missing_or_bad_user_id_is_unauthorized() {
        let (status, _) = principal_from_headers(&HeaderMap::new()).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let (status, _) = principal_from_headers(&headers).unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_declared_size_defaults_to_zero() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_size(&headers), 0);
        headers.insert(FILE_SIZE_HEADER, HeaderValue::from_static("42"));
        assert_eq!(declared_size(&headers), 42);
        headers.insert(FILE_SIZE_HEADER, HeaderValue::from_static("lots"));
        assert_eq!(declared_size(&headers), 0);
    }
}
