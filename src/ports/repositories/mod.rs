mod bucket_repository;
mod file_repository;
mod presigned_repository;
mod usage_repository;

pub use bucket_repository::BucketRepository;
pub use file_repository::FileRepository;
pub use presigned_repository::PresignedRepository;
pub use usage_repository::UsageRepository;
