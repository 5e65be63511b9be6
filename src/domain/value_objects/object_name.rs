use uuid::Uuid;

use crate::domain::errors::ValidationError;

const MAX_OBJECT_NAME_LEN: usize = 1024;

/// A validated object name inside the object-store container
///
/// Drive objects are always named `{bucket_id}/{file_id}`, see
/// [`ObjectName::for_file`]. Arbitrary names are still accepted by
/// [`ObjectName::new`] so that listings of the container can be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName(String);

impl ObjectName {
    pub fn new(value: String) -> Result<Self, ValidationError> {
        if value.is_empty() {
            return Err(ValidationError::EmptyObjectName);
        }

        if value.len() > MAX_OBJECT_NAME_LEN {
            return Err(ValidationError::ObjectNameTooLong {
                actual: value.len(),
                max: MAX_OBJECT_NAME_LEN,
            });
        }

        if let Some(c) = value.chars().find(|c| c.is_control()) {
            return Err(ValidationError::InvalidObjectNameCharacter(c));
        }

        if value.starts_with('/') {
            return Err(ValidationError::ObjectNameStartsWithSlash);
        }

        if value.contains("//") {
            return Err(ValidationError::ObjectNameContainsDoubleSlash);
        }

        Ok(Self(value))
    }

    /// The deterministic name of a file's object
    pub fn for_file(bucket_id: Uuid, file_id: Uuid) -> Self {
        Self(format!("{}/{}", bucket_id, file_id))
    }

    /// Listing prefix covering every object of a bucket
    pub fn bucket_prefix(bucket_id: Uuid) -> String {
        format!("{}/", bucket_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bucket and file ids, when the name follows the drive layout
    pub fn ids(&self) -> Option<(Uuid, Uuid)> {
        let (bucket, file) = self.0.split_once('/')?;
        Some((bucket.parse().ok()?, file.parse().ok()?))
    }

    pub fn file_id(&self) -> Option<Uuid> {
        self.ids().map(|(_, file)| file)
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
