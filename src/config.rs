use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::app::AppError;
use crate::domain::value_objects::ContainerName;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_PRESIGN_TTL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_ORPHAN_GRACE_PERIOD: Duration = Duration::from_secs(60 * 60);

/// Tunables injected into every orchestration service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveSettings {
    /// Object-store container holding every drive object
    pub object_container: ContainerName,
    /// Upload ceiling in bytes, checked before and after streaming
    pub max_file_size: u64,
    /// TTL of presigned URLs when the caller asks for none
    pub presign_ttl: Duration,
    /// Bound on each metadata-store and control-plane object-store call
    pub operation_timeout: Duration,
    /// Bound on streaming uploads
    pub transfer_timeout: Duration,
    /// Objects younger than this are never treated as orphans
    pub orphan_grace_period: Duration,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            object_container: ContainerName::default(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            presign_ttl: DEFAULT_PRESIGN_TTL,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            orphan_grace_period: DEFAULT_ORPHAN_GRACE_PERIOD,
        }
    }
}

impl DriveSettings {
    /// Read `DRIVE_*` variables, falling back to the defaults for unset ones
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let object_container = match env::var("DRIVE_OBJECT_CONTAINER") {
            Ok(raw) => ContainerName::new(raw).map_err(|e| AppError::Configuration {
                message: format!("DRIVE_OBJECT_CONTAINER: {}", e),
            })?,
            Err(_) => defaults.object_container,
        };

        Ok(Self {
            object_container,
            max_file_size: parse_var("DRIVE_MAX_FILE_SIZE")?.unwrap_or(defaults.max_file_size),
            presign_ttl: seconds_var("DRIVE_PRESIGN_TTL_SECS")?.unwrap_or(defaults.presign_ttl),
            operation_timeout: seconds_var("DRIVE_OPERATION_TIMEOUT_SECS")?
                .unwrap_or(defaults.operation_timeout),
            transfer_timeout: seconds_var("DRIVE_TRANSFER_TIMEOUT_SECS")?
                .unwrap_or(defaults.transfer_timeout),
            orphan_grace_period: seconds_var("DRIVE_ORPHAN_GRACE_SECS")?
                .unwrap_or(defaults.orphan_grace_period),
        })
    }
}

fn parse_var<T>(name: &str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Configuration {
                message: format!("parsing {} value `{}`: {}", name, raw, e),
            }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(AppError::Configuration {
            message: format!("reading {}: {}", name, e),
        }),
    }
}

fn seconds_var(name: &str) -> Result<Option<Duration>, AppError> {
    Ok(parse_var::<u64>(name)?.map(Duration::from_secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = DriveSettings::default();
        assert_eq!(settings.max_file_size, 104_857_600);
        assert_eq!(settings.presign_ttl, Duration::from_secs(900));
        assert_eq!(settings.operation_timeout, Duration::from_secs(5));
        assert_eq!(settings.transfer_timeout, Duration::from_secs(300));
        assert_eq!(settings.object_container.as_str(), "drive-objects");
    }
}
