/// Validation errors for domain value objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    // BucketName validation errors
    EmptyBucketName,
    BucketNameTooLong {
        actual: usize,
        max: usize,
    },

    // ContainerName validation errors
    ContainerNameTooShort {
        actual: usize,
        min: usize,
    },
    ContainerNameTooLong {
        actual: usize,
        max: usize,
    },
    ContainerNameInvalidStart,
    ContainerNameInvalidEnd,
    ContainerNameInvalidCharacter(char),
    ContainerNameConsecutiveHyphens,
    ContainerNameLooksLikeIpAddress,

    // ObjectName validation errors
    EmptyObjectName,
    ObjectNameTooLong {
        actual: usize,
        max: usize,
    },
    InvalidObjectNameCharacter(char),
    ObjectNameStartsWithSlash,
    ObjectNameContainsDoubleSlash,

    // Checksum validation errors
    MalformedChecksum(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // BucketName errors
            ValidationError::EmptyBucketName => write!(f, "Bucket name cannot be empty"),
            ValidationError::BucketNameTooLong { actual, max } => {
                write!(
                    f,
                    "Bucket name too long: {} characters (max: {})",
                    actual, max
                )
            }

            // ContainerName errors
            ValidationError::ContainerNameTooShort { actual, min } => {
                write!(
                    f,
                    "Container name too short: {} characters (min: {})",
                    actual, min
                )
            }
            ValidationError::ContainerNameTooLong { actual, max } => {
                write!(
                    f,
                    "Container name too long: {} characters (max: {})",
                    actual, max
                )
            }
            ValidationError::ContainerNameInvalidStart => {
                write!(f, "Container name must start with a lowercase letter or digit")
            }
            ValidationError::ContainerNameInvalidEnd => {
                write!(f, "Container name must end with a lowercase letter or digit")
            }
            ValidationError::ContainerNameInvalidCharacter(c) => {
                write!(f, "Invalid character in container name: {:?}", c)
            }
            ValidationError::ContainerNameConsecutiveHyphens => {
                write!(f, "Container name cannot contain consecutive hyphens")
            }
            ValidationError::ContainerNameLooksLikeIpAddress => {
                write!(f, "Container name cannot be formatted as an IP address")
            }

            // ObjectName errors
            ValidationError::EmptyObjectName => write!(f, "Object name cannot be empty"),
            ValidationError::ObjectNameTooLong { actual, max } => {
                write!(f, "Object name too long: {} bytes (max: {})", actual, max)
            }
            ValidationError::InvalidObjectNameCharacter(c) => {
                write!(f, "Invalid character in object name: {:?}", c)
            }
            ValidationError::ObjectNameStartsWithSlash => {
                write!(f, "Object name cannot start with '/'")
            }
            ValidationError::ObjectNameContainsDoubleSlash => {
                write!(f, "Object name cannot contain '//'")
            }

            ValidationError::MalformedChecksum(value) => {
                write!(f, "Checksum is not a hex encoded SHA-256 digest: {}", value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}
