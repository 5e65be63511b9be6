pub mod errors;
pub mod models;
pub mod value_objects;

// Re-export commonly used types
pub use errors::{
    Backend, DriveError, DriveResult, ErrorKind, RepositoryError,
    RepositoryResult, Resource, StorageError, StorageResult, ValidationError,
};
pub use models::*;
pub use value_objects::*;
