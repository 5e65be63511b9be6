/// Errors reported by the object store adapter
///
/// These never reach callers directly; the orchestrators translate them
/// into [`DriveError`](super::DriveError) kinds.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Object not found in the given container
    ObjectNotFound { container: String, name: String },

    /// Container (object-store bucket) does not exist
    ContainerNotFound { container: String },

    /// Operation not supported by this backend
    UnsupportedOperation { operation: String, reason: String },

    /// Validation error on data coming back from the store
    ValidationError { message: String },

    /// The payload stream supplied by the caller failed mid-transfer
    PayloadError { message: String },

    /// Infrastructure error with external source
    InfrastructureError {
        message: String,
        source: Option<String>, // Store error as string to allow Clone
    },
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::ObjectNotFound { container, name } => {
                write!(f, "Object not found: {}/{}", container, name)
            }
            StorageError::ContainerNotFound { container } => {
                write!(f, "Container not found: {}", container)
            }
            StorageError::UnsupportedOperation { operation, reason } => {
                write!(f, "Unsupported operation '{}': {}", operation, reason)
            }
            StorageError::ValidationError { message } => {
                write!(f, "Validation error: {}", message)
            }
            StorageError::PayloadError { message } => {
                write!(f, "Payload stream failed: {}", message)
            }
            StorageError::InfrastructureError { message, .. } => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
