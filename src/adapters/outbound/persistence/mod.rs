// Error mapping
pub(crate) mod error;

pub mod schema;

// Repository implementations
pub mod in_memory_metadata_store;
pub mod sql_bucket_repository;
pub mod sql_file_repository;
pub mod sql_presigned_repository;
pub mod sql_usage_repository;

pub use in_memory_metadata_store::InMemoryMetadataStore;
pub use schema::migrate;
pub use sql_bucket_repository::SqlBucketRepository;
pub use sql_file_repository::SqlFileRepository;
pub use sql_presigned_repository::SqlPresignedRepository;
pub use sql_usage_repository::SqlUsageRepository;
