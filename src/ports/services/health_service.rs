use async_trait::async_trait;
use serde::Serialize;

/// Readiness of the two backing stores
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessReport {
    pub metadata_store: bool,
    pub object_store: bool,
    /// Components that failed their check
    pub degraded: Vec<String>,
}

impl ReadinessReport {
    pub fn is_ready(&self) -> bool {
        self.metadata_store && self.object_store
    }
}

#[async_trait]
pub trait HealthService: Send + Sync + 'static {
    async fn readiness(&self) -> ReadinessReport;
}
