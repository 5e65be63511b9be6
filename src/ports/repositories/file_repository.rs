use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::RepositoryResult,
    models::{FileMetadata, FileObject, NewFileMetadata},
};

/// Persistence of file metadata
#[async_trait]
pub trait FileRepository: Send + Sync + 'static {
    async fn create_file(&self, file: &NewFileMetadata) -> RepositoryResult<FileMetadata>;

    /// Files of a bucket, newest first
    async fn list_files(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileMetadata>>;

    /// Lookup joined against the bucket's owner
    async fn get_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>>;

    /// Lookup without the ownership filter
    async fn get_file_by_id(&self, file_id: Uuid) -> RepositoryResult<Option<FileMetadata>>;

    /// Delete the row if the owner matches and return what was deleted
    async fn delete_file(
        &self,
        owner_id: Uuid,
        bucket_id: Uuid,
        file_id: Uuid,
    ) -> RepositoryResult<Option<FileMetadata>>;

    /// Object names and sizes of every file in the bucket
    async fn list_objects_for_bucket(&self, bucket_id: Uuid) -> RepositoryResult<Vec<FileObject>>;
}
