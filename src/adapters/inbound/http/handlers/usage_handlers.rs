use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    adapters::inbound::http::{
        dto::{ListSnapshotsResponseDto, SnapshotsQuery, UsageSnapshotDto},
        error::{ApiError, api_error},
        router::AppState,
    },
    domain::models::Principal,
};

/// Handle usage history listing, newest first
pub async fn list_snapshots(
    State(app_state): State<AppState>,
    principal: Principal,
    Query(query): Query<SnapshotsQuery>,
) -> Result<Json<ListSnapshotsResponseDto>, ApiError> {
    let snapshots = app_state
        .usage_service
        .list_snapshots(principal.user_id, query.effective_limit())
        .await
        .map_err(api_error)?;

    Ok(Json(ListSnapshotsResponseDto {
        snapshots: snapshots.into_iter().map(UsageSnapshotDto::from).collect(),
    }))
}
