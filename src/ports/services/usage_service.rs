use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    errors::DriveResult,
    models::{UsageDelta, UsageSnapshot, UsageStats},
};

/// Usage accounting shared by the bucket and file orchestrators
#[async_trait]
pub trait UsageService: Send + Sync + 'static {
    /// Zeroed counters for a new bucket
    async fn initialize(&self, bucket_id: Uuid) -> DriveResult<()>;

    async fn apply_delta(&self, bucket_id: Uuid, delta: UsageDelta) -> DriveResult<UsageStats>;

    /// Append an owner-wide aggregate snapshot
    async fn snapshot(&self, owner_id: Uuid) -> DriveResult<UsageSnapshot>;

    /// Historical snapshots, newest first
    async fn list_snapshots(&self, owner_id: Uuid, limit: usize) -> DriveResult<Vec<UsageSnapshot>>;
}
