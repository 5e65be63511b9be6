use async_trait::async_trait;
use serde::Serialize;

use crate::domain::errors::DriveResult;

/// Outcome of an orphan sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Objects listed in the container
    pub scanned: usize,
    /// Orphans removed
    pub removed: usize,
    /// Orphan candidates younger than the grace period
    pub skipped_recent: usize,
    /// Objects whose names do not follow the drive layout
    pub skipped_foreign: usize,
    /// Removals that failed; retried on the next sweep
    pub failed: usize,
}

/// Cleanup of objects left behind by failed compensations
///
/// Never invoked by the request path.
#[async_trait]
pub trait ReconciliationService: Send + Sync + 'static {
    async fn sweep_orphans(&self) -> DriveResult<SweepReport>;
}
