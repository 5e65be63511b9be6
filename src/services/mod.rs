mod bucket_service_impl;
mod deadline;
mod file_service_impl;
mod health_service_impl;
mod presigned_service_impl;
mod reconciliation_service_impl;
mod usage_service_impl;

pub use bucket_service_impl::BucketServiceImpl;
pub use file_service_impl::FileServiceImpl;
pub use health_service_impl::HealthServiceImpl;
pub use presigned_service_impl::PresignedServiceImpl;
pub use reconciliation_service_impl::ReconciliationServiceImpl;
pub use usage_service_impl::UsageServiceImpl;
