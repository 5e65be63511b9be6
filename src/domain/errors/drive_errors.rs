use uuid::Uuid;

use super::{RepositoryError, StorageError, ValidationError};

/// The entity a lookup was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Bucket,
    File,
    Object,
    UsageCounter,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::Bucket => "bucket",
            Resource::File => "file",
            Resource::Object => "object",
            Resource::UsageCounter => "usage counter",
        };
        f.write_str(name)
    }
}

/// Which backing system failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    MetadataStore,
    ObjectStore,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::MetadataStore => f.write_str("metadata store"),
            Backend::ObjectStore => f.write_str("object store"),
        }
    }
}

/// Stable error kinds surfaced to the transport layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    NameConflict,
    TooLarge,
    InvalidMethod,
    MismatchedResource,
    AccessDenied,
    Validation,
    Unavailable,
    Internal,
}

/// Errors returned by the orchestration services
#[derive(Debug, Clone, thiserror::Error)]
pub enum DriveError {
    /// Bucket or file absent, or not owned by the caller
    #[error("{resource} not found")]
    NotFound { resource: Resource },

    /// Duplicate bucket name for the same owner
    #[error("bucket name '{name}' already exists")]
    NameConflict { name: String },

    /// Declared or actual payload size exceeds the configured ceiling
    #[error("payload of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Presign request for an unsupported verb
    #[error("unsupported presign method '{method}'")]
    InvalidMethod { method: String },

    /// File does not belong to the stated bucket
    #[error("file {file_id} does not belong to bucket {bucket_id}")]
    MismatchedResource { bucket_id: Uuid, file_id: Uuid },

    /// Ownership or scope-token check failed
    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A backing store was unreachable, failed, or timed out
    #[error("{backend} unavailable: {message}")]
    Unavailable { backend: Backend, message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DriveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriveError::NotFound { .. } => ErrorKind::NotFound,
            DriveError::NameConflict { .. } => ErrorKind::NameConflict,
            DriveError::TooLarge { .. } => ErrorKind::TooLarge,
            DriveError::InvalidMethod { .. } => ErrorKind::InvalidMethod,
            DriveError::MismatchedResource { .. } => ErrorKind::MismatchedResource,
            DriveError::AccessDenied { .. } => ErrorKind::AccessDenied,
            DriveError::Validation(_) => ErrorKind::Validation,
            DriveError::Unavailable { .. } => ErrorKind::Unavailable,
            DriveError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn not_found(resource: Resource) -> Self {
        DriveError::NotFound { resource }
    }

    pub fn access_denied(reason: impl Into<String>) -> Self {
        DriveError::AccessDenied {
            reason: reason.into(),
        }
    }

    pub fn unavailable(backend: Backend, message: impl Into<String>) -> Self {
        DriveError::Unavailable {
            backend,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DriveError::Internal {
            message: message.into(),
        }
    }

    /// Whether the message may reveal backend details and must be hidden
    /// from the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unavailable | ErrorKind::Internal
        )
    }
}

impl From<RepositoryError> for DriveError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { resource } => DriveError::NotFound { resource },
            RepositoryError::Unavailable { message } => {
                DriveError::unavailable(Backend::MetadataStore, message)
            }
            RepositoryError::Conflict { constraint } => {
                DriveError::internal(format!("unexpected constraint violation: {}", constraint))
            }
            RepositoryError::Corrupt { message } => DriveError::internal(message),
        }
    }
}

impl From<StorageError> for DriveError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound { .. } => DriveError::not_found(Resource::Object),
            StorageError::ContainerNotFound { container } => DriveError::unavailable(
                Backend::ObjectStore,
                format!("container '{}' is missing", container),
            ),
            StorageError::InfrastructureError { message, .. } => {
                DriveError::unavailable(Backend::ObjectStore, message)
            }
            StorageError::PayloadError { message } => DriveError::internal(message),
            StorageError::UnsupportedOperation { .. } | StorageError::ValidationError { .. } => {
                DriveError::internal(err.to_string())
            }
        }
    }
}

/// Result type for orchestration operations
pub type DriveResult<T> = Result<T, DriveError>;
