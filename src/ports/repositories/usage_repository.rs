use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::RepositoryResult,
    models::{UsageDelta, UsageSnapshot, UsageStats},
};

/// Per-bucket usage counters and per-owner snapshots
#[async_trait]
pub trait UsageRepository: Send + Sync + 'static {
    /// Create a zeroed counter row if none exists
    async fn ensure_usage_row(&self, bucket_id: Uuid) -> RepositoryResult<()>;

    /// Atomically add `delta`, clamping both counters at zero
    ///
    /// Inserts the (floored) delta when the row does not exist yet.
    async fn apply_delta(&self, bucket_id: Uuid, delta: UsageDelta) -> RepositoryResult<UsageStats>;

    /// Counters of a bucket; zero when no row exists
    async fn get_usage(&self, bucket_id: Uuid) -> RepositoryResult<UsageStats>;

    /// Sum the owner's bucket counters and append a snapshot row
    async fn record_snapshot(&self, owner_id: Uuid) -> RepositoryResult<UsageSnapshot>;

    /// Snapshot history, newest first
    async fn list_snapshots(&self, owner_id: Uuid, limit: usize)
        -> RepositoryResult<Vec<UsageSnapshot>>;
}
