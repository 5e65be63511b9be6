use std::time::Duration;

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    adapters::inbound::http::{
        dto::{PresignUrlDto, PresignedUrlDto},
        error::{ApiError, api_error, bad_request},
        router::AppState,
    },
    domain::models::{PresignMethod, PresignRequest, Principal},
};

/// Longest lifetime S3 accepts for a SigV4 presigned URL
pub const MAX_PRESIGN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Handle presigned URL issuance for one file
pub async fn generate_presigned_url(
    State(app_state): State<AppState>,
    principal: Principal,
    Path((bucket_id, file_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<PresignUrlDto>,
) -> Result<Json<PresignedUrlDto>, ApiError> {
    let ttl = match body.ttl_seconds {
        Some(0) => return Err(bad_request("ttl_seconds must be positive")),
        Some(secs) if secs > MAX_PRESIGN_TTL_SECS => {
            return Err(bad_request(&format!(
                "ttl_seconds must not exceed {}",
                MAX_PRESIGN_TTL_SECS
            )));
        }
        other => other.map(Duration::from_secs),
    };

    let request = PresignRequest::builder()
        .actor_id(principal.user_id)
        .bucket_id(bucket_id)
        .file_id(file_id)
        .method(
            body.method
                .unwrap_or_else(|| PresignMethod::Get.as_str().to_string()),
        )
        .maybe_ttl(ttl)
        .maybe_scope(body.scope)
        .build();

    let issued = app_state
        .presigned_service
        .generate_url(request)
        .await
        .map_err(api_error)?;

    Ok(Json(issued.into()))
}
