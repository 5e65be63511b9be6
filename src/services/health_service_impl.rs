use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::errors::Backend,
    ports::{
        repositories::BucketRepository,
        services::{HealthService, ReadinessReport},
        storage::ObjectStore,
    },
};

/// Readiness check over both backing stores
#[derive(Clone)]
pub struct HealthServiceImpl {
    buckets: Arc<dyn BucketRepository>,
    store: Arc<dyn ObjectStore>,
    settings: DriveSettings,
}

impl HealthServiceImpl {
    pub fn new(
        buckets: Arc<dyn BucketRepository>,
        store: Arc<dyn ObjectStore>,
        settings: DriveSettings,
    ) -> Self {
        Self {
            buckets,
            store,
            settings,
        }
    }
}

#[async_trait]
impl HealthService for HealthServiceImpl {
    async fn readiness(&self) -> ReadinessReport {
        let timeout = self.settings.operation_timeout;

        let (metadata, objects) = tokio::join!(
            bounded(timeout, Backend::MetadataStore, "ping", self.buckets.ping()),
            bounded(
                timeout,
                Backend::ObjectStore,
                "container exists",
                self.store.container_exists(&self.settings.object_container),
            ),
        );

        let mut degraded = Vec::new();

        let metadata_store = match metadata {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "metadata store not ready");
                degraded.push("metadata_store".to_string());
                false
            }
        };

        let object_store = match objects {
            Ok(true) => true,
            Ok(false) => {
                warn!(container = %self.settings.object_container, "object container missing");
                degraded.push("object_store".to_string());
                false
            }
            Err(e) => {
                warn!(error = %e, "object store not ready");
                degraded.push("object_store".to_string());
                false
            }
        };

        ReadinessReport {
            metadata_store,
            object_store,
            degraded,
        }
    }
}
