use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::RepositoryResult,
    models::{Bucket, NewBucket},
};

/// Persistence of drive buckets
///
/// Reads that take an `owner_id` filter on it; a bucket owned by someone
/// else is reported exactly like a missing one.
#[async_trait]
pub trait BucketRepository: Send + Sync + 'static {
    /// Insert a bucket; a duplicate (owner, name) yields `RepositoryError::Conflict`
    async fn create_bucket(&self, bucket: &NewBucket) -> RepositoryResult<Bucket>;

    /// All buckets of an owner, oldest first
    async fn list_buckets(&self, owner_id: Uuid) -> RepositoryResult<Vec<Bucket>>;

    async fn get_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>>;

    /// Lookup without the ownership filter
    async fn get_bucket_by_id(&self, bucket_id: Uuid) -> RepositoryResult<Option<Bucket>>;

    /// Delete the bucket row; files and the usage row go with it
    ///
    /// Returns `false` when nothing matched.
    async fn delete_bucket(&self, owner_id: Uuid, bucket_id: Uuid) -> RepositoryResult<bool>;

    /// Round trip to the store, used by readiness checks
    async fn ping(&self) -> RepositoryResult<()>;
}
