use std::str::FromStr;

use crate::domain::errors::ValidationError;

const MIN_LEN: usize = 3;
const MAX_LEN: usize = 63;

/// Name of the object-store container (an S3 bucket) that holds every drive object
///
/// Follows the S3 naming rules so the same value works against AWS, MinIO
/// and the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerName(String);

impl ContainerName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();

        if value.len() < MIN_LEN {
            return Err(ValidationError::ContainerNameTooShort {
                actual: value.len(),
                min: MIN_LEN,
            });
        }
        if value.len() > MAX_LEN {
            return Err(ValidationError::ContainerNameTooLong {
                actual: value.len(),
                max: MAX_LEN,
            });
        }

        let is_edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !value.starts_with(is_edge) {
            return Err(ValidationError::ContainerNameInvalidStart);
        }
        if !value.ends_with(is_edge) {
            return Err(ValidationError::ContainerNameInvalidEnd);
        }

        if let Some(c) = value
            .chars()
            .find(|&c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.'))
        {
            return Err(ValidationError::ContainerNameInvalidCharacter(c));
        }

        if value.contains("--") || value.contains("..") {
            return Err(ValidationError::ContainerNameConsecutiveHyphens);
        }

        if value.split('.').count() == 4 && value.split('.').all(|p| p.parse::<u8>().is_ok()) {
            return Err(ValidationError::ContainerNameLooksLikeIpAddress);
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerName {
    fn default() -> Self {
        Self("drive-objects".to_string())
    }
}

impl FromStr for ContainerName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ContainerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContainerName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_container_names() {
        assert!(ContainerName::new("drive-objects").is_ok());
        assert!(ContainerName::new("drive123").is_ok());
        assert!(ContainerName::new("123drive").is_ok());
        assert!(ContainerName::new("drive.objects.eu").is_ok());
        assert!(ContainerName::new(ContainerName::default().as_str()).is_ok());
    }

    #[test]
    fn test_invalid_container_names() {
        assert_eq!(
            ContainerName::new("ab"),
            Err(ValidationError::ContainerNameTooShort { actual: 2, min: 3 })
        );
        assert!(ContainerName::new("a".repeat(64)).is_err());
        assert_eq!(
            ContainerName::new("-drive"),
            Err(ValidationError::ContainerNameInvalidStart)
        );
        assert_eq!(
            ContainerName::new("drive-"),
            Err(ValidationError::ContainerNameInvalidEnd)
        );
        assert_eq!(
            ContainerName::new("Drive"),
            Err(ValidationError::ContainerNameInvalidStart)
        );
        assert_eq!(
            ContainerName::new("drive_objects"),
            Err(ValidationError::ContainerNameInvalidCharacter('_'))
        );
        assert!(ContainerName::new("drive--objects").is_err());
        assert_eq!(
            ContainerName::new("192.168.1.1"),
            Err(ValidationError::ContainerNameLooksLikeIpAddress)
        );
    }
}
