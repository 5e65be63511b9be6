use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-bucket counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    pub total_bytes: i64,
    pub file_count: i64,
}

impl UsageStats {
    /// Add a delta, clamping each counter at zero
    pub fn apply(self, delta: UsageDelta) -> Self {
        Self {
            total_bytes: self.total_bytes.saturating_add(delta.bytes).max(0),
            file_count: self.file_count.saturating_add(delta.files).max(0),
        }
    }
}

impl std::ops::Add for UsageStats {
    type Output = UsageStats;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            total_bytes: self.total_bytes.saturating_add(rhs.total_bytes),
            file_count: self.file_count.saturating_add(rhs.file_count),
        }
    }
}

impl std::iter::Sum for UsageStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(UsageStats::default(), |acc, s| acc + s)
    }
}

/// Signed adjustment applied to a bucket's counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageDelta {
    pub bytes: i64,
    pub files: i64,
}

impl UsageDelta {
    pub fn new(bytes: i64, files: i64) -> Self {
        Self { bytes, files }
    }

    pub fn for_upload(size_bytes: i64) -> Self {
        Self::new(size_bytes, 1)
    }

    pub fn for_delete(size_bytes: i64) -> Self {
        Self::new(-size_bytes, -1)
    }
}

/// Immutable record of an owner's aggregate usage at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub total_bytes: i64,
    pub file_count: i64,
    pub captured_at: DateTime<Utc>,
}

impl UsageSnapshot {
    pub fn capture(owner_id: Uuid, totals: UsageStats) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            total_bytes: totals.total_bytes,
            file_count: totals.file_count,
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_floors_at_zero() {
        let stats = UsageStats {
            total_bytes: 10,
            file_count: 1,
        };
        assert_eq!(
            stats.apply(UsageDelta::for_delete(25)),
            UsageStats::default()
        );
        assert_eq!(
            UsageStats::default().apply(UsageDelta::new(-5, 2)),
            UsageStats {
                total_bytes: 0,
                file_count: 2
            }
        );
    }

    #[test]
    fn test_sum_of_stats() {
        let total: UsageStats = [
            UsageStats {
                total_bytes: 11,
                file_count: 1,
            },
            UsageStats {
                total_bytes: 4,
                file_count: 2,
            },
        ]
        .into_iter()
        .sum();
        assert_eq!(total.total_bytes, 15);
        assert_eq!(total.file_count, 3);
    }
}
