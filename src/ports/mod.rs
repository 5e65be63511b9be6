pub mod metrics;
pub mod repositories;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use metrics::{MetricEvent, MetricsRecorder, NoopMetrics};
pub use repositories::{
    BucketRepository, FileRepository, PresignedRepository, UsageRepository,
};
pub use services::{
    BucketService, FileService, HealthService, PresignedService, ReadinessReport,
    ReconciliationService, SweepReport, UsageService,
};
pub use storage::{ObjectInfo, ObjectInfoStream, ObjectStore};
