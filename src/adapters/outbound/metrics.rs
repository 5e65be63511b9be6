use std::sync::Mutex;

use tracing::info;

use crate::ports::metrics::{MetricEvent, MetricsRecorder};

/// Emits each event as a structured `tracing` record
///
/// A log pipeline can aggregate on the `counter` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsRecorder;

impl MetricsRecorder for TracingMetricsRecorder {
    fn record(&self, event: MetricEvent) {
        match &event {
            MetricEvent::BucketDeleted { objects_removed } => {
                info!(counter = event.name(), objects_removed, "metric")
            }
            MetricEvent::UploadCompleted { bytes } | MetricEvent::FileDeleted { bytes } => {
                info!(counter = event.name(), bytes, "metric")
            }
            MetricEvent::UploadRejected { reason } => {
                info!(counter = event.name(), reason, "metric")
            }
            MetricEvent::PresignIssued { method } => {
                info!(counter = event.name(), method = method.as_str(), "metric")
            }
            _ => info!(counter = event.name(), "metric"),
        }
    }
}

/// Keeps every event in memory, for assertions in tests
#[derive(Debug, Default)]
pub struct InMemoryMetricsRecorder {
    events: Mutex<Vec<MetricEvent>>,
}

impl InMemoryMetricsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of recorded events with the given counter name
    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl MetricsRecorder for InMemoryMetricsRecorder {
    fn record(&self, event: MetricEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
