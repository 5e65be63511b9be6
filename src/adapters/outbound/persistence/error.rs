use crate::domain::errors::{RepositoryError, Resource};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Translate a sqlx failure on `resource` into a repository error
pub(crate) fn map_sqlx_error(err: sqlx::Error, resource: Resource) -> RepositoryError {
    match &err {
        sqlx::Error::RowNotFound => RepositoryError::not_found(resource),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => RepositoryError::Conflict {
                constraint: db.constraint().unwrap_or("unique").to_string(),
            },
            // The parent row is gone; report the entity the caller addressed
            Some(FOREIGN_KEY_VIOLATION) => RepositoryError::not_found(resource),
            _ => RepositoryError::Unavailable {
                message: format!("database error on {}: {}", resource, db.message()),
            },
        },
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => RepositoryError::Corrupt {
            message: format!("{} row: {}", resource, err),
        },
        _ => RepositoryError::Unavailable {
            message: format!("{} query failed: {}", resource, err),
        },
    }
}
