use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::deadline::bounded;
use crate::{
    config::DriveSettings,
    domain::{
        errors::{Backend, DriveError, DriveResult, Resource},
        models::{
            normalize_content_type, DigestingStream, FileDownload, FileMetadata, NewFileMetadata,
            UploadRequest, UsageDelta,
        },
        value_objects::{ContainerName, FileName, ObjectName},
    },
    ports::{
        metrics::{MetricEvent, MetricsRecorder},
        repositories::{BucketRepository, FileRepository},
        services::{FileService, UsageService},
        storage::ObjectStore,
    },
};

/// File orchestrator
///
/// Uploads write the object before the metadata row; deletes remove the
/// row before the object. Either way a crash leaves at worst an orphaned
/// object, never a row pointing at nothing.
#[derive(Clone)]
pub struct FileServiceImpl {
    buckets: Arc<dyn BucketRepository>,
    files: Arc<dyn FileRepository>,
    store: Arc<dyn ObjectStore>,
    usage: Arc<dyn UsageService>,
    settings: DriveSettings,
    metrics: Arc<dyn MetricsRecorder>,
}

impl FileServiceImpl {
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

    fn container(&self) -> &ContainerName {
        &self.settings.object_container
    }

    async fn ensure_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<()> {
        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "get bucket",
            self.buckets.get_bucket(owner_id, bucket_id),
        )
        .await?
        .map(|_| ())
        .ok_or(DriveError::not_found(Resource::Bucket))
    }

    fn too_large(&self, size: u64) -> DriveError {
        self.metrics.record(MetricEvent::UploadRejected {
            reason: "too_large",
        });
        DriveError::TooLarge {
            size,
            limit: self.settings.max_file_size,
        }
    }

    /// Best-effort removal of an object written by a failed upload
    ///
    /// Runs once; failure is only logged and leaves an orphan for the sweep.
    async fn compensate(&self, name: &ObjectName) {
        let removal = bounded(
            self.settings.operation_timeout,
            Backend::ObjectStore,
            "remove object",
            self.store.remove_object(self.container(), name),
        )
        .await;

        match removal {
            Ok(()) => debug!(object = %name, "removed object of failed upload"),
            Err(e) => {
                warn!(object = %name, error = %e, "compensating removal failed, object orphaned");
                self.metrics.record(MetricEvent::CompensationFailed);
            }
        }
    }
}

fn stored_name(file: &FileMetadata) -> DriveResult<ObjectName> {
    ObjectName::new(file.object_name.clone())
        .map_err(|e| DriveError::internal(format!("stored object name of {}: {}", file.id, e)))
}

#[async_trait]
impl FileService for FileServiceImpl {
    #[instrument(
        skip(self, request),
        fields(
            owner_id = %request.owner_id,
            bucket_id = %request.bucket_id,
            declared_size = request.declared_size,
            file_id = tracing::field::Empty
        )
    )]
    async fn upload(&self, request: UploadRequest) -> DriveResult<FileMetadata> {
        let UploadRequest {
            owner_id,
            bucket_id,
            body,
            declared_size,
            filename,
            content_type,
        } = request;

        self.ensure_bucket(owner_id, bucket_id).await?;

        if declared_size > self.settings.max_file_size {
            return Err(self.too_large(declared_size));
        }

        let file_id = Uuid::new_v4();
        tracing::Span::current().record("file_id", tracing::field::display(file_id));
        let object_name = ObjectName::for_file(bucket_id, file_id);
        let original_filename = FileName::sanitize(filename.as_deref());
        let content_type = normalize_content_type(content_type.as_deref());

        let max = self.settings.max_file_size;
        let (body, digest) = DigestingStream::new(body);
        let written = bounded(
            self.settings.transfer_timeout,
            Backend::ObjectStore,
            "stream object",
            self.store.put_object(
                self.container(),
                &object_name,
                body.with_limit(max).boxed(),
                declared_size,
                &content_type,
            ),
        )
        .await;

        let stored = match written {
            Ok(stored) => stored,
            // the store aborts the write when the body errors, so nothing is left behind
            Err(_) if digest.exceeded(max) => {
                warn!(read = digest.bytes_read(), "payload exceeded the limit mid-stream");
                return Err(self.too_large(digest.bytes_read()));
            }
            Err(e) => {
                error!(error = %e, "object write failed");
                return Err(e);
            }
        };

        if stored > max {
            warn!(stored, "streamed payload exceeded the limit, removing object");
            self.compensate(&object_name).await;
            return Err(self.too_large(stored));
        }

        if stored != digest.bytes_read() {
            warn!(
                stored,
                hashed = digest.bytes_read(),
                "store reported a size different from the bytes streamed"
            );
        }

        let size_bytes = i64::try_from(stored)
            .map_err(|_| DriveError::internal(format!("stored size {} out of range", stored)))?;

        let new_file = NewFileMetadata {
            id: file_id,
            bucket_id,
            object_name: object_name.clone(),
            original_filename,
            size_bytes,
            content_type,
            checksum: digest.checksum(),
        };

        let metadata = match bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "create file metadata",
            self.files.create_file(&new_file),
        )
        .await
        {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(error = %e, "persisting metadata failed after object write");
                self.compensate(&object_name).await;
                return Err(e);
            }
        };

        self.usage
            .apply_delta(bucket_id, UsageDelta::for_upload(size_bytes))
            .await?;
        self.usage.snapshot(owner_id).await?;

        info!(size_bytes, checksum = %metadata.checksum, "file uploaded");
        self.metrics
            .record(MetricEvent::UploadCompleted { bytes: stored });
        Ok(metadata)
    }

    #[instrument(skip(self))]
    async fn list_files(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<Vec<FileMetadata>> {
        self.ensure_bucket(owner_id, bucket_id).await?;

        bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "list files",
            self.files.list_files(bucket_id),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn download(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> DriveResult<FileDownload> {
        let metadata = bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "get file",
            self.files.get_file(owner_id, bucket_id, file_id),
        )
        .await?
        .ok_or(DriveError::not_found(Resource::File))?;

        let name = stored_name(&metadata)?;
        let body = bounded(
            self.settings.operation_timeout,
            Backend::ObjectStore,
            "open object",
            self.store.get_object(self.container(), &name),
        )
        .await
        .inspect_err(|e| error!(object = %name, error = %e, "metadata present but object unreadable"))?;

        Ok(FileDownload { metadata, body })
    }

    #[instrument(skip(self))]
    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> DriveResult<FileMetadata> {
        let deleted = bounded(
            self.settings.operation_timeout,
            Backend::MetadataStore,
            "delete file metadata",
            self.files.delete_file(owner_id, bucket_id, file_id),
        )
        .await?
        .ok_or(DriveError::not_found(Resource::File))?;

        // Usage follows the row even when the object outlives it; the
        // leftover object is reported to the caller and left for the sweep.
        let removed = match stored_name(&deleted) {
            Ok(name) => bounded(
                self.settings.operation_timeout,
                Backend::ObjectStore,
                "remove object",
                self.store.remove_object(self.container(), &name),
            )
            .await
            .inspect_err(|e| {
                warn!(object = %name, error = %e, "object removal failed after metadata delete")
            }),
            Err(e) => {
                error!(error = %e, "cannot remove object of deleted file");
                Err(e)
            }
        };

        self.usage
            .apply_delta(bucket_id, UsageDelta::for_delete(deleted.size_bytes))
            .await?;

        if let Err(e) = self.usage.snapshot(owner_id).await {
            warn!(error = %e, "usage snapshot after delete failed");
        }

        if let Err(e) = removed {
            self.metrics.record(MetricEvent::CompensationFailed);
            return Err(e);
        }

        info!(size_bytes = deleted.size_bytes, "file deleted");
        self.metrics.record(MetricEvent::FileDeleted {
            bytes: deleted.size_bytes.max(0) as u64,
        });
        Ok(deleted)
    }
}
