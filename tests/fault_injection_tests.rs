mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{objects_in_bucket, upload};
use futures::{StreamExt, future::join_all, stream};
use drive_server::{
    ApacheObjectStoreAdapter, AppDependencies, AppServices, ByteStream, ContainerName, DriveError,
    DriveSettings, ErrorKind, InMemoryMetadataStore, InMemoryMetricsRecorder, ObjectName,
    ObjectStore, PresignMethod, UploadRequest,
    domain::{
        errors::{Backend, RepositoryError, RepositoryResult, StorageError, StorageResult},
        models::{FileMetadata, FileObject, NewFileMetadata, byte_stream_from},
    },
    ports::{FileRepository, NoopMetrics, ObjectInfoStream},
};
use uuid::Uuid;

/// Object store with switchable faults
struct FaultyStore {
    inner: ApacheObjectStoreAdapter,
    hang_puts: AtomicBool,
    /// Report `INFLATED_BY` extra bytes for every write
    inflate_puts: AtomicBool,
    fail_removes: AtomicBool,
    /// End every listing with an error after the real entries
    break_listings: AtomicBool,
    removes: AtomicUsize,
}

const INFLATED_BY: u64 = 1 << 20;

impl FaultyStore {
    fn new() -> Self {
        Self {
            inner: ApacheObjectStoreAdapter::in_memory(),
            hang_puts: AtomicBool::new(false),
            inflate_puts: AtomicBool::new(false),
            fail_removes: AtomicBool::new(false),
            break_listings: AtomicBool::new(false),
            removes: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_object(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        body: ByteStream,
        declared_size: u64,
        content_type: &str,
    ) -> StorageResult<u64> {
        if self.hang_puts.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let written = self
            .inner
            .put_object(container, name, body, declared_size, content_type)
            .await?;
        if self.inflate_puts.load(Ordering::SeqCst) {
            return Ok(written + INFLATED_BY);
        }
        Ok(written)
    }

    async fn get_object(
        &self,
        container: &ContainerName,
        name: &ObjectName,
    ) -> StorageResult<ByteStream> {
        self.inner.get_object(container, name).await
    }

    async fn remove_object(&self, container: &ContainerName, name: &ObjectName) -> StorageResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(StorageError::InfrastructureError {
                message: "connection reset".to_string(),
                source: None,
            });
        }
        self.inner.remove_object(container, name).await
    }

    async fn container_exists(&self, container: &ContainerName) -> StorageResult<bool> {
        self.inner.container_exists(container).await
    }

    async fn create_container(&self, container: &ContainerName) -> StorageResult<()> {
        self.inner.create_container(container).await
    }

    async fn presign_url(
        &self,
        container: &ContainerName,
        name: &ObjectName,
        method: PresignMethod,
        ttl: Duration,
    ) -> StorageResult<String> {
        self.inner.presign_url(container, name, method, ttl).await
    }

    async fn list_objects(
        &self,
        container: &ContainerName,
        prefix: &str,
    ) -> StorageResult<ObjectInfoStream> {
        let listing = self.inner.list_objects(container, prefix).await?;
        if !self.break_listings.load(Ordering::SeqCst) {
            return Ok(listing);
        }
        let broken = stream::once(async {
            Err(StorageError::InfrastructureError {
                message: "listing interrupted".to_string(),
                source: None,
            })
        });
        Ok(listing.chain(broken).boxed())
    }
}

/// File repository that refuses inserts
struct RejectingFiles {
    inner: InMemoryMetadataStore,
}

#[async_trait]
impl FileRepository for RejectingFiles {
    async fn create_file(&self, _file: &NewFileMetadata) -> RepositoryResult<FileMetadata> {
        Err(RepositoryError::Unavailable {
            message: "too many connections".to_string(),
        })
    }

    async fn list_files(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileMetadata>> {
        self.inner.list_files(bucket_id).await
    }

    async fn get_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        self.inner.get_file(owner_id, bucket_id, file_id).await
    }

    async fn get_file_by_id(&self, file_id: Uuid) -> RepositoryResult<Option<FileMetadata>> {
        self.inner.get_file_by_id(file_id).await
    }

    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>> {
        self.inner.delete_file(owner_id, bucket_id, file_id).await
    }

    async fn list_objects_for_bucket(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileObject>> {
        self.inner.list_objects_for_bucket(bucket_id).await
    }
}

struct Harness {
    app: AppServices,
    store: Arc<FaultyStore>,
    metadata: InMemoryMetadataStore,
    metrics: Arc<InMemoryMetricsRecorder>,
}

async fn harness(settings: DriveSettings, files: Option<Arc<dyn FileRepository>>) -> Harness {
    let metadata = InMemoryMetadataStore::new();
    let store = Arc::new(FaultyStore::new());
    store
        .create_container(&settings.object_container)
        .await
        .unwrap();
    let metrics = Arc::new(InMemoryMetricsRecorder::new());

    let deps = AppDependencies {
        object_store: store.clone(),
        bucket_repository: Arc::new(metadata.clone()),
        file_repository: files.unwrap_or_else(|| Arc::new(metadata.clone())),
        usage_repository: Arc::new(metadata.clone()),
        presigned_repository: Arc::new(metadata.clone()),
        metrics: metrics.clone(),
    };

    Harness {
        app: AppServices::from_dependencies(deps, settings),
        store,
        metadata,
        metrics,
    }
}

#[tokio::test]
async fn test_metadata_failure_removes_written_object() {
    let metadata = InMemoryMetadataStore::new();
    let files: Arc<dyn FileRepository> = Arc::new(RejectingFiles {
        inner: metadata.clone(),
    });

    let settings = DriveSettings::default();
    let store = Arc::new(ApacheObjectStoreAdapter::in_memory());
    store.create_container(&settings.object_container).await.unwrap();
    let deps = AppDependencies {
        object_store: store,
        bucket_repository: Arc::new(metadata.clone()),
        file_repository: files,
        usage_repository: Arc::new(metadata.clone()),
        presigned_repository: Arc::new(metadata.clone()),
        metrics: Arc::new(NoopMetrics),
    };
    let app = AppServices::from_dependencies(deps, settings);

    let owner = Uuid::new_v4();
    let bucket = app.bucket_service.create_bucket(owner, "docs", None).await.unwrap();

    let err = app
        .file_service
        .upload(
            UploadRequest::builder()
                .owner_id(owner)
                .bucket_id(bucket.id)
                .body(byte_stream_from("payload"))
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DriveError::Unavailable {
            backend: Backend::MetadataStore,
            ..
        }
    ));
    assert!(objects_in_bucket(&app, bucket.id).await.is_empty());
    assert_eq!(metadata.scan_usage(bucket.id).await.total_bytes, 0);

    let usage = app.bucket_service.get_bucket(owner, bucket.id).await.unwrap().usage;
    assert_eq!(usage.file_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_transfer_times_out() {
    let settings = DriveSettings {
        transfer_timeout: Duration::from_secs(2),
        ..DriveSettings::default()
    };
    let h = harness(settings, None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "slow", None).await.unwrap();

    h.store.hang_puts.store(true, Ordering::SeqCst);
    let err = h
        .app
        .file_service
        .upload(
            UploadRequest::builder()
                .owner_id(owner)
                .bucket_id(bucket.id)
                .body(byte_stream_from("never lands"))
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DriveError::Unavailable {
            backend: Backend::ObjectStore,
            ..
        }
    ));
    assert!(h.app.file_service.list_files(owner, bucket.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_reports_object_removal_failure() {
    let h = harness(DriveSettings::default(), None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "docs", None).await.unwrap();
    let file = upload(&h.app, owner, bucket.id, "a.txt", b"abcdef").await;

    h.store.fail_removes.store(true, Ordering::SeqCst);
    let err = h
        .app
        .file_service
        .delete_file(owner, bucket.id, file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    // the row is gone and usage follows it
    assert!(h.app.file_service.list_files(owner, bucket.id).await.unwrap().is_empty());
    let usage = h.app.bucket_service.get_bucket(owner, bucket.id).await.unwrap().usage;
    assert_eq!((usage.total_bytes, usage.file_count), (0, 0));
    assert_eq!(h.metrics.count("drive.compensation.failed"), 1);
    assert_eq!(h.metrics.count("drive.files.deleted"), 0);

    // the object outlived its row
    assert_eq!(objects_in_bucket(&h.app, bucket.id).await.len(), 1);
}

#[tokio::test]
async fn test_oversized_store_report_is_rolled_back() {
    let settings = DriveSettings {
        max_file_size: 64,
        ..DriveSettings::default()
    };
    let h = harness(settings, None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "docs", None).await.unwrap();

    h.store.inflate_puts.store(true, Ordering::SeqCst);
    let err = h
        .app
        .file_service
        .upload(
            UploadRequest::builder()
                .owner_id(owner)
                .bucket_id(bucket.id)
                .body(byte_stream_from("well under the limit"))
                .build(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DriveError::TooLarge { limit: 64, .. }));
    assert_eq!(h.store.removes.load(Ordering::SeqCst), 1);
    assert!(objects_in_bucket(&h.app, bucket.id).await.is_empty());
    assert!(h.app.file_service.list_files(owner, bucket.id).await.unwrap().is_empty());

    let usage = h.app.bucket_service.get_bucket(owner, bucket.id).await.unwrap().usage;
    assert_eq!((usage.total_bytes, usage.file_count), (0, 0));
    assert_eq!(h.metadata.scan_usage(bucket.id).await.file_count, 0);
    assert_eq!(h.metrics.count("drive.uploads.completed"), 0);
}

#[tokio::test]
async fn test_concurrent_uploads_keep_usage_consistent() {
    const PAYLOADS: [&[u8]; 6] = [b"a", b"bb", b"ccc", b"", b"eeeee", b"ffffffffff"];

    let h = harness(DriveSettings::default(), None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "busy", None).await.unwrap();

    let names: Vec<String> = (0..PAYLOADS.len()).map(|i| format!("f{}.txt", i)).collect();
    let uploaded = join_all(
        names
            .iter()
            .zip(PAYLOADS)
            .map(|(name, data)| upload(&h.app, owner, bucket.id, name, data)),
    )
    .await;
    assert_eq!(uploaded.len(), PAYLOADS.len());

    let expected_bytes: i64 = PAYLOADS.iter().map(|p| p.len() as i64).sum();
    let scanned = h.metadata.scan_usage(bucket.id).await;
    assert_eq!((scanned.total_bytes, scanned.file_count), (expected_bytes, 6));

    let usage = h.app.bucket_service.get_bucket(owner, bucket.id).await.unwrap().usage;
    assert_eq!(
        (usage.total_bytes, usage.file_count),
        (scanned.total_bytes, scanned.file_count)
    );
    assert_eq!(objects_in_bucket(&h.app, bucket.id).await.len(), 6);
}

#[tokio::test]
async fn test_bucket_delete_aborts_when_object_removal_fails() {
    let h = harness(DriveSettings::default(), None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "docs", None).await.unwrap();
    upload(&h.app, owner, bucket.id, "a.txt", b"abc").await;

    h.store.fail_removes.store(true, Ordering::SeqCst);
    let err = h
        .app
        .bucket_service
        .delete_bucket(owner, bucket.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    let still_there = h.app.bucket_service.get_bucket(owner, bucket.id).await.unwrap();
    assert_eq!(still_there.usage.file_count, 1);
}

#[tokio::test]
async fn test_sweep_removes_only_old_orphans() {
    let settings = DriveSettings {
        orphan_grace_period: Duration::ZERO,
        ..DriveSettings::default()
    };
    let h = harness(settings.clone(), None).await;
    let owner = Uuid::new_v4();
    let bucket = h.app.bucket_service.create_bucket(owner, "docs", None).await.unwrap();
    let kept = upload(&h.app, owner, bucket.id, "kept.txt", b"keep me").await;

    let container = &settings.object_container;
    let orphan = ObjectName::for_file(bucket.id, Uuid::new_v4());
    let foreign = ObjectName::new("imports/legacy.csv".to_string()).unwrap();
    for name in [&orphan, &foreign] {
        h.store
            .put_object(container, name, byte_stream_from("x"), 1, "text/plain")
            .await
            .unwrap();
    }

    h.store.fail_removes.store(true, Ordering::SeqCst);
    let report = h.app.reconciliation_service.sweep_orphans().await.unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.removed, 0);

    h.store.fail_removes.store(false, Ordering::SeqCst);
    let report = h.app.reconciliation_service.sweep_orphans().await.unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.skipped_foreign, 1);
    assert_eq!(h.metrics.count("drive.orphans.removed"), 1);

    let remaining = objects_in_bucket(&h.app, bucket.id).await;
    assert_eq!(remaining, vec![kept.object_name.to_string()]);
}

#[tokio::test]
async fn test_sweep_respects_grace_period() {
    let h = harness(DriveSettings::default(), None).await;
    let orphan = ObjectName::for_file(Uuid::new_v4(), Uuid::new_v4());
    h.store
        .put_object(
            &h.app.settings.object_container,
            &orphan,
            byte_stream_from("fresh"),
            5,
            "text/plain",
        )
        .await
        .unwrap();

    let report = h.app.reconciliation_service.sweep_orphans().await.unwrap();
    assert_eq!(report.skipped_recent, 1);
    assert_eq!(report.removed, 0);
}

#[tokio::test]
async fn test_sweep_fails_when_listing_breaks() {
    let settings = DriveSettings {
        orphan_grace_period: Duration::ZERO,
        ..DriveSettings::default()
    };
    let h = harness(settings.clone(), None).await;
    let orphan = ObjectName::for_file(Uuid::new_v4(), Uuid::new_v4());
    h.store
        .put_object(&settings.object_container, &orphan, byte_stream_from("x"), 1, "text/plain")
        .await
        .unwrap();

    h.store.break_listings.store(true, Ordering::SeqCst);
    let err = h.app.reconciliation_service.sweep_orphans().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unavailable);

    // entries ahead of the break were still handled
    assert_eq!(h.metrics.count("drive.orphans.removed"), 1);
}

#[tokio::test]
async fn test_readiness_reports_missing_container() {
    let settings = DriveSettings {
        object_container: ContainerName::new("never-created").unwrap(),
        ..DriveSettings::default()
    };
    let metadata = InMemoryMetadataStore::new();
    let deps = AppDependencies {
        object_store: Arc::new(ApacheObjectStoreAdapter::in_memory()),
        bucket_repository: Arc::new(metadata.clone()),
        file_repository: Arc::new(metadata.clone()),
        usage_repository: Arc::new(metadata.clone()),
        presigned_repository: Arc::new(metadata),
        metrics: Arc::new(InMemoryMetricsRecorder::new()),
    };
    let app = AppServices::from_dependencies(deps, settings);

    let report = app.health_service.readiness().await;
    assert!(!report.is_ready());
    assert!(report.metadata_store);
    assert_eq!(report.degraded, vec!["object_store".to_string()]);
}

#[test]
fn test_storage_errors_map_to_unavailable() {
    let err: DriveError = StorageError::InfrastructureError {
        message: "reset".into(),
        source: None,
    }
    .into();
    assert_eq!(err.kind(), ErrorKind::Unavailable);
}
