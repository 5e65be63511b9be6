use super::Resource;

/// Errors reported by metadata repositories
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    /// No row matched the lookup (including rows hidden by an ownership filter)
    #[error("{resource} not found")]
    NotFound { resource: Resource },

    /// A uniqueness or foreign-key constraint rejected the write
    #[error("constraint violated: {constraint}")]
    Conflict { constraint: String },

    /// The store could not be reached or the statement failed
    #[error("metadata store unavailable: {message}")]
    Unavailable { message: String },

    /// A stored row could not be decoded into a domain value
    #[error("corrupt row: {message}")]
    Corrupt { message: String },
}

impl RepositoryError {
    pub fn not_found(resource: Resource) -> Self {
        RepositoryError::NotFound { resource }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict { .. })
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
