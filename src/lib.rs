pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Models
    Bucket,
    // Value objects
    BucketName,
    ByteStream,
    Checksum,
    ContainerName,
    // Errors
    DriveError,
    DriveResult,
    ErrorKind,
    FileDownload,
    FileMetadata,
    FileName,
    ObjectName,
    PresignMethod,
    PresignRequest,
    PresignedUrl,
    Principal,
    ScopeToken,
    UploadRequest,
    UsageSnapshot,
    UsageStats,
};

// Port types - interfaces for external systems
pub use ports::{
    // Repository ports
    BucketRepository,
    // Service ports
    BucketService,
    FileRepository,
    FileService,
    HealthService,
    MetricEvent,
    MetricsRecorder,
    // Storage ports
    ObjectStore,
    PresignedRepository,
    PresignedService,
    ReconciliationService,
    UsageRepository,
    UsageService,
};

// Service implementations - business logic
pub use services::{
    BucketServiceImpl, FileServiceImpl, HealthServiceImpl, PresignedServiceImpl,
    ReconciliationServiceImpl, UsageServiceImpl,
};

// Application factory and configuration
pub use app::{
    AppBuilder, AppConfig, AppDependencies, AppError, AppServices, RepositoryBackend,
    StorageBackend, create_app_from_env, create_in_memory_app,
};
pub use config::DriveSettings;

// Adapter types - infrastructure implementations
pub use adapters::outbound::{
    metrics::{InMemoryMetricsRecorder, TracingMetricsRecorder},
    persistence::InMemoryMetadataStore,
    storage::{ApacheObjectStoreAdapter, StoreProvider},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        AppBuilder, AppServices, BucketService, DriveError, DriveResult, DriveSettings,
        FileService, Principal, PresignedService, UploadRequest, UsageService,
        create_app_from_env, create_in_memory_app,
    };
}
