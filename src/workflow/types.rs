// Core types for the approval workflow lifecycle

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::errors::WorkflowError;

/// Principal recorded as `resolved_by` when a workflow times out.
pub const SYSTEM_RESOLVER: &str = "system";

/// Opaque free-form payload attached to a workflow. Never interpreted.
pub type WorkflowContext = serde_json::Map<String, serde_json::Value>;

/// Unique workflow identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(String);

impl WorkflowId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for WorkflowId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for WorkflowId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow lifecycle status.
///
/// `Pending` is the only initial state. The other three are terminal and
/// have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowStatus {
    /// Awaiting a reviewer decision
    Pending,
    /// Reviewer approved the action
    Approved,
    /// Reviewer rejected the action
    Rejected,
    /// Expiry passed before anyone reviewed it
    TimedOut,
}

impl WorkflowStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, to: WorkflowStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::TimedOut)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::TimedOut => "TIMED_OUT",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reviewer decision on a pending workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    pub fn target_status(&self) -> WorkflowStatus {
        match self {
            Self::Approve => WorkflowStatus::Approved,
            Self::Reject => WorkflowStatus::Rejected,
        }
    }
}

/// Compute the expiry instant for a workflow created at `created_at`.
///
/// A timeout of zero makes the workflow eligible for timeout on its first
/// evaluation.
pub fn compute_expires_at(created_at: DateTime<Utc>, timeout_minutes: u32) -> DateTime<Utc> {
    created_at + Duration::minutes(i64::from(timeout_minutes))
}

/// A single tracked approval request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRecord {
    pub workflow_id: WorkflowId,
    pub action: String,
    pub requested_by: String,
    pub context: WorkflowContext,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<String>,
}

impl WorkflowRecord {
    /// Build a new pending record
    pub fn new(
        workflow_id: WorkflowId,
        action: impl Into<String>,
        requested_by: impl Into<String>,
        context: WorkflowContext,
        created_at: DateTime<Utc>,
        timeout_minutes: u32,
    ) -> Self {
        Self {
            workflow_id,
            action: action.into(),
            requested_by: requested_by.into(),
            context,
            status: WorkflowStatus::Pending,
            created_at,
            expires_at: compute_expires_at(created_at, timeout_minutes),
            resolved_at: None,
            resolved_by: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == WorkflowStatus::Pending
    }

    /// True when the record is still pending but its expiry has been reached
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_pending() && now >= self.expires_at
    }

    pub fn mark_approved(
        &mut self,
        reviewed_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.resolve(WorkflowStatus::Approved, reviewed_by.into(), at)
    }

    pub fn mark_rejected(
        &mut self,
        reviewed_by: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.resolve(WorkflowStatus::Rejected, reviewed_by.into(), at)
    }

    pub fn mark_timed_out(&mut self, at: DateTime<Utc>) -> Result<(), WorkflowError> {
        self.resolve(WorkflowStatus::TimedOut, SYSTEM_RESOLVER.to_string(), at)
    }

    // Status, resolved_at and resolved_by are written together or not at all.
    fn resolve(
        &mut self,
        to: WorkflowStatus,
        resolved_by: String,
        at: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if !self.status.can_transition_to(to) {
            return Err(WorkflowError::InvalidTransition {
                workflow_id: self.workflow_id.clone(),
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.resolved_at = Some(at);
        self.resolved_by = Some(resolved_by);
        Ok(())
    }
}
