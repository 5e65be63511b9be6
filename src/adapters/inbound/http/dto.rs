use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    domain::{
        errors::DriveError,
        models::{Bucket, FileMetadata, PresignedUrl, ScopeToken, UsageSnapshot},
    },
    ports::services::{ReadinessReport, SweepReport},
};

/// Default and ceiling for `GET /usage/snapshots?limit=`
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 20;
pub const MAX_SNAPSHOT_LIMIT: usize = 100;

/// DTO for creating a bucket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBucketDto {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// DTO for bucket information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketDto {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub total_bytes: i64,
    pub file_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for bucket list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListBucketsResponseDto {
    pub buckets: Vec<BucketDto>,
    pub total_count: usize,
}

/// DTO for file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDto {
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub original_filename: String,
    pub size_bytes: i64,
    pub content_type: String,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for file list response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponseDto {
    pub files: Vec<FileDto>,
    pub total_count: usize,
}

/// DTO for a presign request body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PresignUrlDto {
    /// HTTP verb the URL authorizes; GET when omitted
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
    #[serde(default)]
    pub scope: Option<ScopeToken>,
}

/// DTO for an issued presigned URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresignedUrlDto {
    pub url: String,
    pub expires_at: DateTime<Utc>,
    pub method: String,
}

/// Query for usage snapshot history
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotsQuery {
    pub limit: Option<usize>,
}

impl SnapshotsQuery {
    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_SNAPSHOT_LIMIT)
            .clamp(1, MAX_SNAPSHOT_LIMIT)
    }
}

/// DTO for a usage snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshotDto {
    pub id: Uuid,
    pub total_bytes: i64,
    pub file_count: i64,
    pub captured_at: DateTime<Utc>,
}

/// DTO for snapshot history response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSnapshotsResponseDto {
    pub snapshots: Vec<UsageSnapshotDto>,
}

/// DTO for health responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_store: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_store: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degraded: Vec<String>,
}

/// DTO for an orphan sweep result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReportDto {
    pub scanned: usize,
    pub removed: usize,
    pub skipped_recent: usize,
    pub skipped_foreign: usize,
    pub failed: usize,
}

/// DTO for error responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub error: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
    pub timestamp: DateTime<Utc>,
}

// Conversion implementations

impl From<Bucket> for BucketDto {
    fn from(bucket: Bucket) -> Self {
        BucketDto {
            id: bucket.id,
            name: bucket.name,
            description: bucket.description,
            total_bytes: bucket.usage.total_bytes,
            file_count: bucket.usage.file_count,
            created_at: bucket.created_at,
            updated_at: bucket.updated_at,
        }
    }
}

impl From<FileMetadata> for FileDto {
    fn from(file: FileMetadata) -> Self {
        FileDto {
            id: file.id,
            bucket_id: file.bucket_id,
            original_filename: file.original_filename,
            size_bytes: file.size_bytes,
            content_type: file.content_type,
            checksum: file.checksum,
            created_at: file.created_at,
        }
    }
}

impl From<PresignedUrl> for PresignedUrlDto {
    fn from(url: PresignedUrl) -> Self {
        PresignedUrlDto {
            url: url.url,
            expires_at: url.expires_at,
            method: url.method.as_str().to_string(),
        }
    }
}

impl From<UsageSnapshot> for UsageSnapshotDto {
    fn from(snapshot: UsageSnapshot) -> Self {
        UsageSnapshotDto {
            id: snapshot.id,
            total_bytes: snapshot.total_bytes,
            file_count: snapshot.file_count,
            captured_at: snapshot.captured_at,
        }
    }
}

impl From<ReadinessReport> for HealthDto {
    fn from(report: ReadinessReport) -> Self {
        HealthDto {
            status: if report.is_ready() { "ok" } else { "degraded" }.to_string(),
            metadata_store: Some(report.metadata_store),
            object_store: Some(report.object_store),
            degraded: report.degraded,
        }
    }
}

impl HealthDto {
    pub fn live() -> Self {
        HealthDto {
            status: "ok".to_string(),
            metadata_store: None,
            object_store: None,
            degraded: Vec::new(),
        }
    }
}

impl From<SweepReport> for SweepReportDto {
    fn from(report: SweepReport) -> Self {
        SweepReportDto {
            scanned: report.scanned,
            removed: report.removed,
            skipped_recent: report.skipped_recent,
            skipped_foreign: report.skipped_foreign,
            failed: report.failed,
        }
    }
}

// Error response helpers

impl ErrorResponseDto {
    /// Build the body for a service error
    ///
    /// Messages of `Unavailable` and `Internal` errors are replaced with a
    /// generic text; the full error only goes to the logs.
    pub fn from_drive_error(error: &DriveError) -> Self {
        let mut details = HashMap::new();

        let message = match error {
            DriveError::Unavailable { .. } => "a backing service is unavailable".to_string(),
            DriveError::Internal { .. } => "internal server error".to_string(),
            other => other.to_string(),
        };

        match error {
            DriveError::TooLarge { size, limit } => {
                details.insert("size".to_string(), serde_json::Value::from(*size));
                details.insert("limit".to_string(), serde_json::Value::from(*limit));
            }
            DriveError::InvalidMethod { method } => {
                details.insert(
                    "method".to_string(),
                    serde_json::Value::String(method.clone()),
                );
            }
            DriveError::MismatchedResource { bucket_id, file_id } => {
                details.insert(
                    "bucket_id".to_string(),
                    serde_json::Value::String(bucket_id.to_string()),
                );
                details.insert(
                    "file_id".to_string(),
                    serde_json::Value::String(file_id.to_string()),
                );
            }
            _ => {}
        }

        ErrorResponseDto {
            error: format!("{:?}", error.kind()),
            message,
            details: if details.is_empty() {
                None
            } else {
                Some(details)
            },
            timestamp: Utc::now(),
        }
    }

    pub fn bad_request(message: &str) -> Self {
        ErrorResponseDto {
            error: "BadRequest".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn unauthorized(message: &str) -> Self {
        ErrorResponseDto {
            error: "Unauthorized".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn forbidden(message: &str) -> Self {
        ErrorResponseDto {
            error: "AccessDenied".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }

    pub fn internal_error(message: &str) -> Self {
        ErrorResponseDto {
            error: "Internal".to_string(),
            message: message.to_string(),
            details: None,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::{Backend, Resource};

    #[test]
    fn test_internal_details_are_hidden() {
        let err = DriveError::unavailable(Backend::MetadataStore, "pg at 10.0.0.3 refused");
        let dto = ErrorResponseDto::from_drive_error(&err);
        assert_eq!(dto.error, "Unavailable");
        assert!(!dto.message.contains("10.0.0.3"));

        let err = DriveError::internal("bad row");
        assert!(!ErrorResponseDto::from_drive_error(&err).message.contains("row"));
    }

    #[test]
    fn test_client_errors_keep_message() {
        let dto = ErrorResponseDto::from_drive_error(&DriveError::not_found(Resource::Bucket));
        assert_eq!(dto.error, "NotFound");
        assert_eq!(dto.message, "bucket not found");

        let dto = ErrorResponseDto::from_drive_error(&DriveError::TooLarge { size: 9, limit: 4 });
        let details = dto.details.unwrap();
        assert_eq!(details["limit"], serde_json::json!(4));
    }

    #[test]
    fn test_snapshot_limit_clamped() {
        assert_eq!(SnapshotsQuery::default().effective_limit(), DEFAULT_SNAPSHOT_LIMIT);
        let q = SnapshotsQuery { limit: Some(10_000) };
        assert_eq!(q.effective_limit(), MAX_SNAPSHOT_LIMIT);
        let q = SnapshotsQuery { limit: Some(0) };
        assert_eq!(q.effective_limit(), 1);
    }
}
