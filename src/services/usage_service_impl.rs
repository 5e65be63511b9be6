use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::{
        errors::{Backend, DriveResult},
        models::{UsageDelta, UsageSnapshot, UsageStats},
    },
    ports::{repositories::UsageRepository, services::UsageService},
};

/// Usage accounting over a [`UsageRepository`]
#[derive(Clone)]
pub struct UsageServiceImpl {
    repository: Arc<dyn UsageRepository>,
    settings: DriveSettings,
}

impl UsageServiceImpl {
    pub fn new(repository: Arc<dyn UsageRepository>, settings: DriveSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }
}

#[async_trait]
impl UsageService for UsageServiceImpl {
    #[instrument(skip(self))]
    async fn initialize(&self, bucket_id: Uuid) -> DriveResult<()> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "initialize usage",
            self.repository.ensure_usage_row(bucket_id),
        )
        .await
    }

    #[instrument(skip(self), fields(bytes = delta.bytes, files = delta.files))]
    async fn apply_delta(&self, bucket_id: Uuid, delta: UsageDelta) -> DriveResult<UsageStats> {
        let stats = bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "apply usage delta",
            self.repository.apply_delta(bucket_id, delta),
        )
        .await?;
        debug!(
            total_bytes = stats.total_bytes,
            file_count = stats.file_count,
            "usage updated"
        );
        Ok(stats)
    }

    #[instrument(skip(self))]
    async fn snapshot(&self, owner_id: Uuid) -> DriveResult<UsageSnapshot> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "record usage snapshot",
            self.repository.record_snapshot(owner_id),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_snapshots(&self, owner_id: Uuid, limit: usize) -> DriveResult<Vec<UsageSnapshot>> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "list usage snapshots",
            self.repository.list_snapshots(owner_id, limit),
        )
        .await
    }
}
