use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::{
    create_bucket, delete_bucket, delete_file, download_file, generate_presigned_url, get_bucket,
    list_buckets, list_files, list_snapshots, live, ready, sweep_orphans, upload_file,
};
use crate::{
    app::AppServices,
    ports::services::{
        BucketService, FileService, HealthService, PresignedService, ReconciliationService,
        UsageService,
    },
};

/// Room for multipart boundaries and part headers on top of the payload
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state containing all services
#[derive(Clone)]
pub struct AppState {
    pub bucket_service: Arc<dyn BucketService>,
    pub file_service: Arc<dyn FileService>,
    pub usage_service: Arc<dyn UsageService>,
    pub presigned_service: Arc<dyn PresignedService>,
    pub health_service: Arc<dyn HealthService>,
    pub reconciliation_service: Arc<dyn ReconciliationService>,
    /// Upload ceiling, used to size the request body limit
    pub max_file_size: u64,
}

impl From<&AppServices> for AppState {
    fn from(services: &AppServices) -> Self {
        AppState {
            bucket_service: services.bucket_service.clone(),
            file_service: services.file_service.clone(),
            usage_service: services.usage_service.clone(),
            presigned_service: services.presigned_service.clone(),
            health_service: services.health_service.clone(),
            reconciliation_service: services.reconciliation_service.clone(),
            max_file_size: services.settings.max_file_size,
        }
    }
}

/// Create the main application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .nest("/v1", create_api_router())
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Create a router with just the versioned API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        // Buckets
        .route("/buckets", post(create_bucket).get(list_buckets))
        .route("/buckets/{bucket_id}", get(get_bucket).delete(delete_bucket))
        // Files
        .route("/buckets/{bucket_id}/files", post(upload_file).get(list_files))
        .route("/buckets/{bucket_id}/files/{file_id}", delete(delete_file))
        .route(
            "/buckets/{bucket_id}/files/{file_id}/download",
            get(download_file),
        )
        .route(
            "/buckets/{bucket_id}/files/{file_id}/presigned-url",
            post(generate_presigned_url),
        )
        // Usage
        .route("/usage/snapshots", get(list_snapshots))
        // Maintenance
        .route("/admin/reconcile", post(sweep_orphans))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::create_in_memory_app;
    use axum::http::StatusCode;
    use axum_test::TestServer;

    async fn test_server() -> TestServer {
        let services = create_in_memory_app().await.unwrap();
        TestServer::new(create_router(AppState::from(&services))).unwrap()
    }

    #[tokio::test]
    async fn test_liveness() {
        let server = test_server().await;
        let response = server.get("/health/live").await;
        response.assert_status_ok();
        response.assert_json(&serde_json::json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_readiness_with_in_memory_backends() {
        let server = test_server().await;
        let response = server.get("/health/ready").await;
        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_api_requires_identity() {
        let server = test_server().await;
        let response = server.get("/v1/buckets").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_reconcile_requires_admin() {
        let server = test_server().await;
        let response = server
            .post("/v1/admin/reconcile")
            .add_header("x-user-id", uuid::Uuid::new_v4().to_string())
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post("/v1/admin/reconcile")
            .add_header("x-user-id", uuid::Uuid::new_v4().to_string())
            .add_header("x-user-admin", "true")
            .await;
        response.assert_status_ok();
    }
}
