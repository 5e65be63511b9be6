use std::io;

use crate::domain::{
    errors::StorageError,
    value_objects::{ContainerName, ObjectName},
};

/// Translate an `object_store` failure on a named object
pub(crate) fn object_error(
    err: object_store::Error,
    container: &ContainerName,
    name: &ObjectName,
) -> StorageError {
    match err {
        object_store::Error::NotFound { .. } => StorageError::ObjectNotFound {
            container: container.to_string(),
            name: name.to_string(),
        },
        other => other.into(),
    }
}

/// Convert object_store errors to domain storage errors
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { ref path, .. } => StorageError::ObjectNotFound {
                container: String::new(),
                name: path.clone(),
            },
            object_store::Error::NotSupported { .. }
            | object_store::Error::NotImplemented => StorageError::UnsupportedOperation {
                operation: "object store call".to_string(),
                reason: err.to_string(),
            },
            object_store::Error::InvalidPath { .. } => StorageError::ValidationError {
                message: err.to_string(),
            },
            _ => StorageError::InfrastructureError {
                message: format!("Object store operation failed: {}", err),
                source: Some(err.to_string()),
            },
        }
    }
}

/// Failure of the caller-supplied upload stream
pub(crate) fn payload_error(err: io::Error) -> StorageError {
    StorageError::PayloadError {
        message: err.to_string(),
    }
}

/// Download streams surface store failures as `io::Error`
pub(crate) fn into_io_error(err: object_store::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

pub(crate) fn http_error(operation: &str, err: reqwest::Error) -> StorageError {
    StorageError::InfrastructureError {
        message: format!("{} request failed", operation),
        source: Some(err.to_string()),
    }
}
