use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Lifecycle counters for one store instance
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub created: AtomicU64,
    pub approved: AtomicU64,
    pub rejected: AtomicU64,
    pub timed_out: AtomicU64,
    pub not_found: AtomicU64,
    pub invalid_transitions: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_approved(&self) {
        self.approved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_transition(&self) {
        self.invalid_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> WorkflowMetricsSnapshot {
        WorkflowMetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            approved: self.approved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            invalid_transitions: self.invalid_transitions.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.snapshot();
        info!(
            "Workflow metrics: created={}, approved={}, rejected={}, timed_out={}, not_found={}, invalid_transitions={}",
            stats.created,
            stats.approved,
            stats.rejected,
            stats.timed_out,
            stats.not_found,
            stats.invalid_transitions
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowMetricsSnapshot {
    pub created: u64,
    pub approved: u64,
    pub rejected: u64,
    pub timed_out: u64,
    pub not_found: u64,
    pub invalid_transitions: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        let metrics = WorkflowMetrics::new();
        metrics.record_created();
        metrics.record_created();
        metrics.record_approved();
        metrics.record_invalid_transition();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.created, 2);
        assert_eq!(snapshot.approved, 1);
        assert_eq!(snapshot.rejected, 0);
        assert_eq!(snapshot.invalid_transitions, 1);
    }
}
