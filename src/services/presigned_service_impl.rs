use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::{
        errors::{Backend, DriveError, DriveResult, Resource},
        models::{AuditRecord, PresignMethod, PresignRequest, PresignedRecord, PresignedUrl},
        value_objects::ObjectName,
    },
    ports::{
        metrics::{MetricEvent, MetricsRecorder},
        repositories::{BucketRepository, FileRepository, PresignedRepository},
        services::PresignedService,
        storage::ObjectStore,
    },
};

/// Issues presigned URLs after ownership and scope checks
///
/// Every URL handed out has a matching issuance and audit row.
#[derive(Clone)]
pub struct PresignedServiceImpl {
    buckets: Arc<dyn BucketRepository>,
    files: Arc<dyn FileRepository>,
    presigned: Arc<dyn PresignedRepository>,
    store: Arc<dyn ObjectStore>,
    settings: DriveSettings,
    metrics: Arc<dyn MetricsRecorder>,
}

impl PresignedServiceImpl {
    pub fn new(
        buckets: Arc<dyn BucketRepository>,
        files: Arc<dyn FileRepository>,
        presigned: Arc<dyn PresignedRepository>,
        store: Arc<dyn ObjectStore>,
        settings: DriveSettings,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        Self {
            buckets,
            files,
            presigned,
            store,
            settings,
            metrics,
        }
    }
}

#[async_trait]
impl PresignedService for PresignedServiceImpl {
    #[instrument(
        skip(self, request),
        fields(
            actor_id = %request.actor_id,
            bucket_id = %request.bucket_id,
            file_id = %request.file_id,
            method = %request.method
        )
    )]
    async fn generate_url(&self, request: PresignRequest) -> DriveResult<PresignedUrl> {
        let timeout = self.settings.operation_timeout;

        let bucket = bounded(
            timeout,
            Backend::MetadataStore,
            "get bucket",
            self.buckets.get_bucket_by_id(request.bucket_id),
        )
        .await?
        .ok_or(DriveError::not_found(Resource::Bucket))?;

        let file = bounded(
            timeout,
            Backend::MetadataStore,
            "get file",
            self.files.get_file_by_id(request.file_id),
        )
        .await?
        .ok_or(DriveError::not_found(Resource::File))?;

        let method = PresignMethod::parse(&request.method).ok_or_else(|| {
            DriveError::InvalidMethod {
                method: request.method.clone(),
            }
        })?;

        if file.bucket_id != bucket.id {
            return Err(DriveError::MismatchedResource {
                bucket_id: bucket.id,
                file_id: file.id,
            });
        }

        if bucket.owner_id != request.actor_id {
            warn!("presign denied: caller does not own the bucket");
            return Err(DriveError::access_denied("not the owner"));
        }

        if let Some(scope) = &request.scope {
            scope
                .check(&bucket.name, &file.object_name, method, Utc::now())
                .map_err(|reason| {
                    warn!(reason, "presign denied by scope token");
                    DriveError::access_denied(reason)
                })?;
        }

        let ttl = request.ttl.unwrap_or(self.settings.presign_ttl);
        let object_name = ObjectName::new(file.object_name.clone())
            .map_err(|e| DriveError::internal(format!("stored object name: {}", e)))?;

        let url = bounded(
            timeout,
            Backend::ObjectStore,
            "presign url",
            self.store
                .presign_url(&self.settings.object_container, &object_name, method, ttl),
        )
        .await?;

        let now = Utc::now();
        let expires_at = now
            + chrono::Duration::from_std(ttl)
                .map_err(|_| DriveError::internal(format!("ttl {:?} out of range", ttl)))?;

        let record = PresignedRecord {
            id: Uuid::new_v4(),
            bucket_id: bucket.id,
            file_id: file.id,
            object_name: file.object_name.clone(),
            method,
            expires_at,
            created_at: now,
        };
        let audit = AuditRecord {
            id: Uuid::new_v4(),
            actor_id: request.actor_id,
            bucket_id: bucket.id,
            file_id: file.id,
            method,
            expires_at,
            created_at: now,
        };

        bounded(
            timeout,
            Backend::MetadataStore,
            "record presign issuance",
            self.presigned.save_issuance(&record, &audit),
        )
        .await?;

        info!(%expires_at, "presigned url issued");
        self.metrics.record(MetricEvent::PresignIssued { method });

        Ok(PresignedUrl {
            url,
            expires_at,
            method,
        })
    }
}
