use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::errors::{Backend, DriveResult},
    ports::{
        metrics::{MetricEvent, MetricsRecorder},
        repositories::FileRepository,
        services::{ReconciliationService, SweepReport},
        storage::ObjectStore,
    },
};

/// Removes objects that have no metadata row
///
/// Objects younger than `orphan_grace_period` are left alone so that an
/// upload between its object write and its metadata insert is never
/// mistaken for an orphan.
#[derive(Clone)]
pub struct ReconciliationServiceImpl {
    files: Arc<dyn FileRepository>,
    store: Arc<dyn ObjectStore>,
    settings: DriveSettings,
    metrics: Arc<dyn MetricsRecorder>,
}

impl ReconciliationServiceImpl {
    pub fn new(
        files: Arc<dyn FileRepository>,
        store: Arc<dyn ObjectStore>,
        settings: DriveSettings,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            files,
            store,
            settings,
            metrics,
        }
    }
}

#[async_trait]
impl ReconciliationService for ReconciliationServiceImpl {
    #[instrument(skip(self), fields(container = %self.settings.object_container))]
    async fn sweep_orphans(&self) -> DriveResult<SweepReport> {
        let container = &self.settings.object_container;
        let timeout = self.settings.operation_timeout;

        let mut objects = bounded(
            self.settings.transfer_timeout,
            Backend::ObjectStore,
            "list objects",
            self.store.list_objects(container, ""),
        )
        .await?;

        let now = SystemTime::now();
        let mut report = SweepReport::default();

        // each page of the listing gets its own deadline
        while let Some(object) = bounded(
            self.settings.transfer_timeout,
            Backend::ObjectStore,
            "list objects",
            async { objects.next().await.transpose() },
        )
        .await?
        {
            report.scanned += 1;

            let Some(file_id) = object.name.file_id() else {
                report.skipped_foreign += 1;
                continue;
            };

            let known = bounded(
                timeout,
                Backend::MetadataStore,
                "get file",
                self.files.get_file_by_id(file_id),
            )
            .await?;
            if known.is_some() {
                continue;
            }

            let age = now
                .duration_since(object.last_modified)
                .unwrap_or_default();
            if age < self.settings.orphan_grace_period {
                report.skipped_recent += 1;
                continue;
            }

            match bounded(
                timeout,
                Backend::ObjectStore,
                "remove object",
                self.store.remove_object(container, &object.name),
            )
            .await
            {
                Ok(()) => {
                    debug!(object = %object.name, "orphan removed");
                    self.metrics.record(MetricEvent::OrphanRemoved);
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(object = %object.name, error = %e, "orphan removal failed");
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            removed = report.removed,
            skipped_recent = report.skipped_recent,
            failed = report.failed,
            "orphan sweep finished"
        );
        Ok(report)
    }
}
