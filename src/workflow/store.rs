//! In-memory workflow registry.
//!
//! A single mutex guards the whole registry. Every public operation takes the
//! lock exactly once, so the timeout check inside [`WorkflowStore::get`] and
//! [`WorkflowStore::review`] is atomic with respect to any concurrent review
//! or read of the same record: exactly one terminal outcome wins.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::errors::WorkflowError;
use super::types::{ReviewDecision, WorkflowId, WorkflowRecord, WorkflowStatus};
use crate::observability::{WorkflowMetrics, WorkflowMetricsSnapshot};

/// The closed set of mutations a record can undergo after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Approve {
        reviewed_by: String,
        at: DateTime<Utc>,
    },
    Reject {
        reviewed_by: String,
        at: DateTime<Utc>,
    },
    TimeOut {
        at: DateTime<Utc>,
    },
}

impl Transition {
    pub fn review(
        decision: ReviewDecision,
        reviewed_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        let reviewed_by = reviewed_by.into();
        match decision {
            ReviewDecision::Approve => Self::Approve { reviewed_by, at },
            ReviewDecision::Reject => Self::Reject { reviewed_by, at },
        }
    }

    pub fn target_status(&self) -> WorkflowStatus {
        match self {
            Self::Approve { .. } => WorkflowStatus::Approved,
            Self::Reject { .. } => WorkflowStatus::Rejected,
            Self::TimeOut { .. } => WorkflowStatus::TimedOut,
        }
    }

    fn apply(self, record: &mut WorkflowRecord) -> Result<(), WorkflowError> {
        match self {
            Self::Approve { reviewed_by, at } => record.mark_approved(reviewed_by, at),
            Self::Reject { reviewed_by, at } => record.mark_rejected(reviewed_by, at),
            Self::TimeOut { at } => record.mark_timed_out(at),
        }
    }
}

/// Point-in-time view of the store for status output
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub timed_out: usize,
    pub lifecycle: WorkflowMetricsSnapshot,
}

/// Sole owner of all workflow records. Callers only ever receive clones.
pub struct WorkflowStore {
    records: Mutex<HashMap<WorkflowId, WorkflowRecord>>,
    clock: Arc<dyn Clock>,
    metrics: WorkflowMetrics,
}

impl std::fmt::Debug for WorkflowStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStore")
            .field("records", &self.len())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowStore {
    /// Store backed by the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            metrics: WorkflowMetrics::new(),
        }
    }

    /// Current time according to the store's clock
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // An injected clock can panic while the guard is held. The registry is
    // still consistent then, since every mutation is a single in-place transition.
    fn registry(&self) -> MutexGuard<'_, HashMap<WorkflowId, WorkflowRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new record. Fails rather than overwriting an existing id.
    pub fn create(&self, record: WorkflowRecord) -> Result<WorkflowRecord, WorkflowError> {
        let mut records = self.registry();
        if records.contains_key(&record.workflow_id) {
            warn!(workflow_id = %record.workflow_id, "Rejected duplicate workflow id");
            return Err(WorkflowError::DuplicateId {
                workflow_id: record.workflow_id,
            });
        }

        info!(
            workflow_id = %record.workflow_id,
            action = %record.action,
            requested_by = %record.requested_by,
            expires_at = %record.expires_at,
            "Workflow created"
        );
        records.insert(record.workflow_id.clone(), record.clone());
        self.metrics.record_created();
        Ok(record)
    }

    /// Fetch a record, timing it out first if its expiry has passed
    pub fn get(&self, workflow_id: &WorkflowId) -> Result<WorkflowRecord, WorkflowError> {
        let mut records = self.registry();
        let now = self.clock.now();
        let record = Self::lookup(&mut records, workflow_id, &self.metrics)?;
        self.expire_if_due(record, now);
        debug!(workflow_id = %workflow_id, status = %record.status, "Workflow read");
        Ok(record.clone())
    }

    /// Apply one transition to an existing record.
    ///
    /// This is the primitive both the review and timeout paths go through.
    /// It does not evaluate expiry; callers that need a timeout-consistent
    /// view should use [`WorkflowStore::review`]. A `TimeOut` on a pending
    /// record is refused with a validation error when `at` is before the
    /// record's `expires_at`.
    pub fn update(
        &self,
        workflow_id: &WorkflowId,
        transition: Transition,
    ) -> Result<WorkflowRecord, WorkflowError> {
        let mut records = self.registry();
        let record = Self::lookup(&mut records, workflow_id, &self.metrics)?;
        if let Transition::TimeOut { at } = &transition {
            if record.is_pending() && *at < record.expires_at {
                warn!(
                    workflow_id = %record.workflow_id,
                    at = %at,
                    expires_at = %record.expires_at,
                    "Rejected timeout before expiry"
                );
                return Err(WorkflowError::validation(
                    "at",
                    format!("timeout at {at} precedes expires_at {}", record.expires_at),
                ));
            }
        }
        self.apply(record, transition)?;
        Ok(record.clone())
    }

    /// Resolve a pending workflow with a reviewer decision.
    ///
    /// An expired record is timed out first and the timeout is kept; the
    /// review then fails with `InvalidTransition`.
    pub fn review(
        &self,
        workflow_id: &WorkflowId,
        decision: ReviewDecision,
        reviewed_by: &str,
    ) -> Result<WorkflowRecord, WorkflowError> {
        let mut records = self.registry();
        let now = self.clock.now();
        let record = Self::lookup(&mut records, workflow_id, &self.metrics)?;
        self.expire_if_due(record, now);
        self.apply(record, Transition::review(decision, reviewed_by, now))?;
        Ok(record.clone())
    }

    /// Time out every pending record whose expiry has passed.
    ///
    /// Returns the ids that changed. Lazy evaluation in `get` does not depend
    /// on this ever running.
    pub fn expire_due(&self) -> Vec<WorkflowId> {
        let mut records = self.registry();
        let now = self.clock.now();
        let mut expired = Vec::new();
        for record in records.values_mut() {
            if self.expire_if_due(record, now) {
                expired.push(record.workflow_id.clone());
            }
        }
        expired
    }

    pub fn metrics(&self) -> &WorkflowMetrics {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry().is_empty()
    }

    /// Counts by stored status. Expiry is not evaluated here.
    pub fn stats(&self) -> StoreStats {
        let records = self.registry();
        let mut stats = StoreStats {
            total: records.len(),
            lifecycle: self.metrics.snapshot(),
            ..StoreStats::default()
        };
        for record in records.values() {
            match record.status {
                WorkflowStatus::Pending => stats.pending += 1,
                WorkflowStatus::Approved => stats.approved += 1,
                WorkflowStatus::Rejected => stats.rejected += 1,
                WorkflowStatus::TimedOut => stats.timed_out += 1,
            }
        }
        stats
    }

    fn lookup<'a>(
        records: &'a mut HashMap<WorkflowId, WorkflowRecord>,
        workflow_id: &WorkflowId,
        metrics: &WorkflowMetrics,
    ) -> Result<&'a mut WorkflowRecord, WorkflowError> {
        records.get_mut(workflow_id).ok_or_else(|| {
            metrics.record_not_found();
            debug!(workflow_id = %workflow_id, "Workflow not found");
            WorkflowError::NotFound {
                workflow_id: workflow_id.clone(),
            }
        })
    }

    fn expire_if_due(&self, record: &mut WorkflowRecord, now: DateTime<Utc>) -> bool {
        if !record.is_expired_at(now) {
            return false;
        }
        self.apply(record, Transition::TimeOut { at: now }).is_ok()
    }

    fn apply(
        &self,
        record: &mut WorkflowRecord,
        transition: Transition,
    ) -> Result<(), WorkflowError> {
        let to = transition.target_status();
        if let Err(e) = transition.apply(record) {
            self.metrics.record_invalid_transition();
            warn!(
                workflow_id = %record.workflow_id,
                status = %record.status,
                attempted = %to,
                "Rejected transition on resolved workflow"
            );
            return Err(e);
        }

        match to {
            WorkflowStatus::Approved => self.metrics.record_approved(),
            WorkflowStatus::Rejected => self.metrics.record_rejected(),
            WorkflowStatus::TimedOut => self.metrics.record_timed_out(),
            WorkflowStatus::Pending => {}
        }
        info!(
            workflow_id = %record.workflow_id,
            status = %record.status,
            resolved_by = record.resolved_by.as_deref().unwrap_or_default(),
            "Workflow resolved"
        );
        Ok(())
    }
}
