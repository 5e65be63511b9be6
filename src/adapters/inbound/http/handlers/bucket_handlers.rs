use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    adapters::inbound::http::{
        dto::{BucketDto, CreateBucketDto, ListBucketsResponseDto},
        error::{ApiError, api_error},
        router::AppState,
    },
    domain::models::Principal,
};

/// Handle bucket creation
pub async fn create_bucket(
    State(app_state): State<AppState>,
    principal: Principal,
    Json(body): Json<CreateBucketDto>,
) -> Result<(StatusCode, Json<BucketDto>), ApiError> {
    let bucket = app_state
        .bucket_service
        .create_bucket(principal.user_id, &body.name, body.description)
        .await
        .map_err(api_error)?;

    Ok((StatusCode::CREATED, Json(bucket.into())))
}

/// Handle bucket listing for the caller
pub async fn list_buckets(
    State(app_state): State<AppState>,
    principal: Principal,
) -> Result<Json<ListBucketsResponseDto>, ApiError> {
    let buckets = app_state
        .bucket_service
        .list_buckets(principal.user_id)
        .await
        .map_err(api_error)?;

    let buckets: Vec<BucketDto> = buckets.into_iter().map(BucketDto::from).collect();
    Ok(Json(ListBucketsResponseDto {
        total_count: buckets.len(),
        buckets,
    }))
}

pub async fn get_bucket(
    State(app_state): State<AppState>,
    principal: Principal,
    Path(bucket_id): Path<Uuid>,
) -> Result<Json<BucketDto>, ApiError> {
    let bucket = app_state
        .bucket_service
        .get_bucket(principal.user_id, bucket_id)
        .await
        .map_err(api_error)?;

    Ok(Json(bucket.into()))
}

/// Handle bucket deletion, including every object it holds
pub async fn delete_bucket(
    State(app_state): State<AppState>,
    principal: Principal,
    Path(bucket_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .bucket_service
        .delete_bucket(principal.user_id, bucket_id)
        .await
        .map_err(api_error)?;

    Ok(StatusCode::NO_CONTENT)
}
