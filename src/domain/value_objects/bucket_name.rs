use crate::domain::errors::ValidationError;

/// Maximum length, in characters, of a drive bucket name
pub const MAX_BUCKET_NAME_LEN: usize = 255;

/// A user-facing bucket name
///
/// Surrounding whitespace is trimmed on construction; the trimmed value must
/// be non-empty. Uniqueness per owner is enforced by the metadata store, not
/// here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketName(String);

impl BucketName {
    pub fn new(value: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = value.as_ref().trim();

        if trimmed.is_empty() {
            return Err(ValidationError::EmptyBucketName);
        }

        let len = trimmed.chars().count();
        if len > MAX_BUCKET_NAME_LEN {
            return Err(ValidationError::BucketNameTooLong {
                actual: len,
                max: MAX_BUCKET_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BucketName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
