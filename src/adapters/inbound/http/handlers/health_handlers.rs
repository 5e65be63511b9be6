use axum::{
    Json,
    extract::State,
    http::StatusCode,
};

use crate::adapters::inbound::http::{
    dto::{ErrorResponseDto, HealthDto, SweepReportDto},
    error::{ApiError, api_error},
    router::AppState,
};
use crate::domain::models::Principal;

/// Liveness: the process is serving requests
pub async fn live() -> Json<HealthDto> {
    Json(HealthDto::live())
}

/// Readiness: both backing stores answer
pub async fn ready(State(app_state): State<AppState>) -> (StatusCode, Json<HealthDto>) {
    let report = app_state.health_service.readiness().await;
    let status = if report.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report.into()))
}

/// Run an orphan sweep on demand; admin only
pub async fn sweep_orphans(
    State(app_state): State<AppState>,
    principal: Principal,
) -> Result<Json<SweepReportDto>, ApiError> {
    if !principal.is_admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponseDto::forbidden("admin privileges required")),
        ));
    }

    let report = app_state
        .reconciliation_service
        .sweep_orphans()
        .await
        .map_err(api_error)?;

    Ok(Json(report.into()))
}
