use sha2::{Digest, Sha256};

use crate::domain::errors::ValidationError;

/// Lowercase hex encoded SHA-256 digest of a file's exact bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    pub fn of(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    pub fn from_hasher(hasher: Sha256) -> Self {
        Self(hex::encode(hasher.finalize()))
    }

    /// Parse a stored digest
    pub fn from_hex(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into().to_ascii_lowercase();
        match hex::decode(&value) {
            Ok(bytes) if bytes.len() == 32 => Ok(Self(value)),
            _ => Err(ValidationError::MalformedChecksum(value)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Checksum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
