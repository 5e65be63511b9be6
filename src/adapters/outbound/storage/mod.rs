// Infrastructure error conversions
pub mod error;

// Storage implementations
pub mod apache_object_store_adapter;

// Provider-specific configuration
pub mod s3;

// Re-export key types
pub use apache_object_store_adapter::{ApacheObjectStoreAdapter, StoreProvider};
pub use s3::S3Config;
