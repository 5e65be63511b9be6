use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::{
        errors::{Backend, DriveError, DriveResult, RepositoryError, Resource},
        models::{Bucket, NewBucket},
        value_objects::{BucketName, ObjectName},
    },
    ports::{
        metrics::{MetricEvent, MetricsRecorder},
        repositories::{BucketRepository, FileRepository},
        services::{BucketService, UsageService},
        storage::ObjectStore,
    },
};

/// Bucket orchestrator
///
/// Deleting a bucket removes every object it indexes before touching the
/// metadata, so a failure leaves the bucket listed and retryable.
#[derive(Clone)]
pub struct BucketServiceImpl {
    buckets: Arc<dyn BucketRepository>,
    files: Arc<dyn FileRepository>,
    store: Arc<dyn ObjectStore>,
    usage: Arc<dyn UsageService>,
    settings: DriveSettings,
    metrics: Arc<dyn MetricsRecorder>,
}

impl BucketServiceImpl {
    pub fn new(
        buckets: Arc<dyn BucketRepository>,
        files: Arc<dyn FileRepository>,
        store: Arc<dyn ObjectStore>,
        usage: Arc<dyn UsageService>,
        settings: DriveSettings,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            buckets,
            files,
            store,
            usage,
            settings,
            metrics,
        }
    }

    /// Remove every indexed object of the bucket, stopping at the first failure
    async fn purge_objects(&self, bucket_id: Uuid) -> DriveResult<usize> {
        let objects = bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "list bucket objects",
            self.files.list_objects_for_bucket(bucket_id),
        )
        .await?;

        let container = &self.settings.object_container;
        for object in &objects {
            let name = ObjectName::new(object.object_name.clone())
                .map_err(|e| DriveError::internal(format!("stored object name: {}", e)))?;

            bounded(
                self.settings.operation_timeout,
                Backend::ObjectStore,
                "remove object",
                self.store.remove_object(container, &name),
            )
            .await
            .inspect_err(|e| {
                error!(object = %name, error = %e, "failed to remove object, bucket left intact");
            })?;
        }

        Ok(objects.len())
    }
}

#[async_trait]
impl BucketService for BucketServiceImpl {
    #[instrument(skip(self, description))]
    async fn create_bucket(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> DriveResult<Bucket> {
        let name = BucketName::new(name)?;
        let new_bucket = NewBucket::new(owner_id, name, description);

        let bucket = match tokio::time::timeout(
            self.settings.operation_timeout,
            self.buckets.create_bucket(&new_bucket),
        )
        .await
        {
            Ok(Ok(bucket)) => bucket,
            Ok(Err(RepositoryError::Conflict { .. })) => {
                return Err(DriveError::NameConflict {
                    name: new_bucket.name.into_inner(),
                });
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(DriveError::unavailable(
                    Backend::MetadataStore,
                    "create bucket timed out",
                ));
            }
        };

        self.usage.initialize(bucket.id).await?;

        info!(bucket_id = %bucket.id, name = %bucket.name, "bucket created");
        self.metrics.record(MetricEvent::BucketCreated);
        Ok(bucket)
    }

    #[instrument(skip(self))]
    async fn list_buckets(&self, owner_id: Uuid) -> DriveResult<Vec<Bucket>> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "list buckets",
            self.buckets.list_buckets(owner_id),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<Bucket> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "get bucket",
            self.buckets.get_bucket(owner_id, bucket_id),
        )
        .await?
        .ok_or(DriveError::not_found(Resource::Bucket))
    }

    #[instrument(skip(self))]
    async fn delete_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<()> {
        self.get_bucket(owner_id, bucket_id).await?;

        let objects_removed = self.purge_objects(bucket_id).await?;

        let deleted = bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "delete bucket",
            self.buckets.delete_bucket(owner_id, bucket_id),
        )
        .await?;
        if !deleted {
            warn!("bucket vanished before its row could be deleted");
            return Err(DriveError::not_found(Resource::Bucket));
        }

        self.usage.snapshot(owner_id).await?;

        info!(objects_removed, "bucket deleted");
        self.metrics
            .record(MetricEvent::BucketDeleted { objects_removed });
        Ok(())
    }
}
