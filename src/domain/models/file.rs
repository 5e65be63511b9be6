use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ByteStream;
use crate::domain::value_objects::{Checksum, FileName, ObjectName};

/// Content type recorded when the client supplies none
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Metadata row of a stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub object_name: String,
    pub original_filename: String,
    /// Bytes actually written to the object store
    pub size_bytes: i64,
    pub content_type: String,
    /// Hex SHA-256 of the streamed bytes
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert request for the metadata store, built once the object is written
#[derive(Debug, Clone)]
pub struct NewFileMetadata {
    pub id: Uuid,
    pub bucket_id: Uuid,
    pub object_name: ObjectName,
    pub original_filename: FileName,
    pub size_bytes: i64,
    pub content_type: String,
    pub checksum: Checksum,
}

/// Object name and size of a file, as needed to purge a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileObject {
    pub file_id: Uuid,
    pub object_name: String,
    pub size_bytes: i64,
}

/// A streamed upload into an owner's bucket
#[derive(bon::Builder)]
pub struct UploadRequest {
    pub owner_id: Uuid,
    pub bucket_id: Uuid,
    pub body: ByteStream,
    /// Size announced by the client; 0 when unknown
    #[builder(default)]
    pub declared_size: u64,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("owner_id", &self.owner_id)
            .field("bucket_id", &self.bucket_id)
            .field("declared_size", &self.declared_size)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Metadata plus an open read stream of the object
pub struct FileDownload {
    pub metadata: FileMetadata,
    pub body: ByteStream,
}

impl std::fmt::Debug for FileDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDownload")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Normalize a client content type, falling back to [`DEFAULT_CONTENT_TYPE`]
pub fn normalize_content_type(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
