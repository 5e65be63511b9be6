use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{errors::DriveResult, models::Bucket};

/// Bucket lifecycle for an owner
#[async_trait]
pub trait BucketService: Send + Sync + 'static {
    /// Create a bucket with a zeroed usage row
    async fn create_bucket(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<String>,
    ) -> DriveResult<Bucket>;

    async fn list_buckets(&self, owner_id: Uuid) -> DriveResult<Vec<Bucket>>;

    async fn get_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<Bucket>;

    /// Remove every object of the bucket, then its metadata
    async fn delete_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> DriveResult<()>;
}
