use std::fmt;

use crate::domain::models::PresignMethod;

/// Something worth counting that happened inside a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricEvent {
    BucketCreated,
    BucketDeleted { objects_removed: usize },
    UploadCompleted { bytes: u64 },
    UploadRejected { reason: &'static str },
    FileDeleted { bytes: u64 },
    PresignIssued { method: PresignMethod },
    /// A compensating removal failed and an object may be orphaned
    CompensationFailed,
    OrphanRemoved,
}

impl MetricEvent {
    /// Counter name the event increments
    pub fn name(&self) -> &'static str {
        match self {
            MetricEvent::BucketCreated => "drive.buckets.created",
            MetricEvent::BucketDeleted { .. } => "drive.buckets.deleted",
            MetricEvent::UploadCompleted { .. } => "drive.uploads.completed",
            MetricEvent::UploadRejected { .. } => "drive.uploads.rejected",
            MetricEvent::FileDeleted { .. } => "drive.files.deleted",
            MetricEvent::PresignIssued { .. } => "drive.presign.issued",
            MetricEvent::CompensationFailed => "drive.compensation.failed",
            MetricEvent::OrphanRemoved => "drive.orphans.removed",
        }
    }
}

impl fmt::Display for MetricEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability injected into each service for emitting counters
pub trait MetricsRecorder: Send + Sync + 'static {
    fn record(&self, event: MetricEvent);
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record(&self, _event: MetricEvent) {}
}
