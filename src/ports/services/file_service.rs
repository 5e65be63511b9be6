use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::DriveResult,
    models::{FileDownload, FileMetadata, UploadRequest},
};

/// Upload, download and delete of files inside an owner's buckets
#[async_trait]
pub trait FileService: Send + Sync + 'static {
    /// Stream a payload into a bucket; the object is written before the metadata
    async fn upload(&self, request: UploadRequest) -> DriveResult<FileMetadata>;

    async fn list_files(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<Vec<FileMetadata>>;

    async fn download(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> DriveResult<FileDownload>;

    /// Delete the metadata, then the object; returns the deleted record
    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> DriveResult<FileMetadata>;
}
