mod bucket_service;
mod file_service;
mod health_service;
mod presigned_service;
mod reconciliation_service;
mod usage_service;

pub use bucket_service::BucketService;
pub use file_service::FileService;
pub use health_service::{HealthService, ReadinessReport};
pub use presigned_service::PresignedService;
pub use reconciliation_service::{ReconciliationService, SweepReport};
pub use usage_service::UsageService;
