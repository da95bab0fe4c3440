//! Request/response schema and the service facade the transport layer calls.
//!
//! Input validation happens here, before anything reaches the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::telemetry::{create_workflow_span, generate_correlation_id};
use crate::workflow::{
    ReviewDecision, WorkflowContext, WorkflowError, WorkflowId, WorkflowRecord, WorkflowStatus,
    WorkflowStore,
};

pub const DEFAULT_TIMEOUT_MINUTES: u32 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflowRequest {
    pub action: String,
    pub requested_by: String,
    #[serde(default)]
    pub context: WorkflowContext,
    /// Signed so that a negative value surfaces as a validation error
    #[serde(default)]
    pub timeout_minutes: Option<i64>,
}

impl CreateWorkflowRequest {
    pub fn new(action: impl Into<String>, requested_by: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            requested_by: requested_by.into(),
            context: WorkflowContext::new(),
            timeout_minutes: None,
        }
    }

    pub fn with_context(mut self, context: WorkflowContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_timeout_minutes(mut self, timeout_minutes: i64) -> Self {
        self.timeout_minutes = Some(timeout_minutes);
        self
    }

    /// Check required fields and resolve the effective timeout
    pub fn validate(&self, default_timeout_minutes: u32) -> Result<u32, WorkflowError> {
        require_non_empty("action", &self.action)?;
        require_non_empty("requested_by", &self.requested_by)?;

        match self.timeout_minutes {
            None => Ok(default_timeout_minutes),
            Some(minutes) if minutes < 0 => Err(WorkflowError::validation(
                "timeout_minutes",
                format!("must be greater than or equal to 0, got {minutes}"),
            )),
            Some(minutes) => u32::try_from(minutes).map_err(|_| {
                WorkflowError::validation("timeout_minutes", format!("{minutes} is too large"))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkflowResponse {
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub reviewed_by: String,
}

impl ReviewRequest {
    pub fn new(reviewed_by: impl Into<String>) -> Self {
        Self {
            reviewed_by: reviewed_by.into(),
        }
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        require_non_empty("reviewed_by", &self.reviewed_by)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDetailResponse {
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

impl From<WorkflowRecord> for WorkflowDetailResponse {
    fn from(record: WorkflowRecord) -> Self {
        Self {
            workflow_id: record.workflow_id,
            action: record.action,
            requested_by: record.requested_by,
            context: record.context,
            status: record.status,
            created_at: record.created_at,
            expires_at: record.expires_at,
            resolved_at: record.resolved_at,
            resolved_by: record.resolved_by,
        }
    }
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), WorkflowError> {
    if value.trim().is_empty() {
        return Err(WorkflowError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Entry point for request handlers. Cheap to clone; all clones share one store.
#[derive(Debug, Clone)]
pub struct WorkflowService {
    store: Arc<WorkflowStore>,
    default_timeout_minutes: u32,
}

impl WorkflowService {
    pub fn new(store: Arc<WorkflowStore>) -> Self {
        Self::with_default_timeout(store, DEFAULT_TIMEOUT_MINUTES)
    }

    pub fn with_default_timeout(store: Arc<WorkflowStore>, default_timeout_minutes: u32) -> Self {
        Self {
            store,
            default_timeout_minutes,
        }
    }

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    pub fn create_workflow(
        &self,
        request: CreateWorkflowRequest,
    ) -> Result<CreateWorkflowResponse, WorkflowError> {
        let timeout_minutes = request.validate(self.default_timeout_minutes)?;
        let correlation_id = generate_correlation_id();
        let _span = create_workflow_span("create", None, &correlation_id).entered();

        let record = WorkflowRecord::new(
            WorkflowId::generate(),
            request.action,
            request.requested_by,
            request.context,
            self.store.now(),
            timeout_minutes,
        );
        let record = self.store.create(record)?;
        Ok(CreateWorkflowResponse {
            workflow_id: record.workflow_id,
            status: record.status,
            expires_at: record.expires_at,
        })
    }

    pub fn get_workflow(&self, workflow_id: &str) -> Result<WorkflowDetailResponse, WorkflowError> {
        let correlation_id = generate_correlation_id();
        let _span = create_workflow_span("get", Some(workflow_id), &correlation_id).entered();
        self.store
            .get(&WorkflowId::from(workflow_id))
            .map(WorkflowDetailResponse::from)
    }

    pub fn approve_workflow(
        &self,
        workflow_id: &str,
        request: ReviewRequest,
    ) -> Result<WorkflowDetailResponse, WorkflowError> {
        self.review_workflow(workflow_id, ReviewDecision::Approve, request)
    }

    pub fn reject_workflow(
        &self,
        workflow_id: &str,
        request: ReviewRequest,
    ) -> Result<WorkflowDetailResponse, WorkflowError> {
        self.review_workflow(workflow_id, ReviewDecision::Reject, request)
    }

    pub fn review_workflow(
        &self,
        workflow_id: &str,
        decision: ReviewDecision,
        request: ReviewRequest,
    ) -> Result<WorkflowDetailResponse, WorkflowError> {
        request.validate()?;
        let correlation_id = generate_correlation_id();
        let _span = create_workflow_span("review", Some(workflow_id), &correlation_id).entered();
        self.store
            .review(&WorkflowId::from(workflow_id), decision, &request.reviewed_by)
            .map(WorkflowDetailResponse::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{Clock, ManualClock};
    use chrono::Duration;
    use serde_json::json;

    fn service() -> (WorkflowService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let store = Arc::new(WorkflowStore::with_clock(clock.clone()));
        (WorkflowService::new(store), clock)
    }

    #[test]
    fn test_create_uses_default_timeout() {
        let (service, clock) = service();
        let response = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice"))
            .unwrap();
        assert_eq!(response.status, WorkflowStatus::Pending);
        assert_eq!(response.expires_at, clock.now() + Duration::minutes(30));
    }

    #[test]
    fn test_validation_rejects_before_store() {
        let (service, _clock) = service();

        let err = service
            .create_workflow(CreateWorkflowRequest::new("", "alice"))
            .unwrap_err();
        assert_eq!(err, WorkflowError::validation("action", "must not be empty"));

        let err = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "  "))
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice").with_timeout_minutes(-1))
            .unwrap_err();
        assert!(err.to_string().contains("timeout_minutes"));

        assert!(service.store().is_empty());
    }

    #[test]
    fn test_timeout_above_u32_range_is_rejected() {
        let (service, _clock) = service();
        let too_large = i64::from(u32::MAX) + 1;

        let err = service
            .create_workflow(
                CreateWorkflowRequest::new("deploy", "alice").with_timeout_minutes(too_large),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Validation {
                field: "timeout_minutes",
                ..
            }
        ));
        assert!(service.store().is_empty());

        let largest = service
            .create_workflow(
                CreateWorkflowRequest::new("deploy", "alice")
                    .with_timeout_minutes(i64::from(u32::MAX)),
            )
            .unwrap();
        assert_eq!(largest.status, WorkflowStatus::Pending);
    }

    #[test]
    fn test_review_requires_reviewer() {
        let (service, _clock) = service();
        let created = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice"))
            .unwrap();

        let err = service
            .approve_workflow(created.workflow_id.as_str(), ReviewRequest::new(""))
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let detail = service.get_workflow(created.workflow_id.as_str()).unwrap();
        assert_eq!(detail.status, WorkflowStatus::Pending);
    }

    #[test]
    fn test_request_defaults_when_deserializing() {
        let request: CreateWorkflowRequest =
            serde_json::from_value(json!({"action": "deploy", "requested_by": "alice"})).unwrap();
        assert!(request.context.is_empty());
        assert_eq!(request.timeout_minutes, None);
        assert_eq!(request.validate(DEFAULT_TIMEOUT_MINUTES).unwrap(), 30);
    }

    #[test]
    fn test_detail_serializes_nulls_and_status_strings() {
        let (service, _clock) = service();
        let created = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice"))
            .unwrap();
        let detail = service.get_workflow(created.workflow_id.as_str()).unwrap();

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["status"], "PENDING");
        assert!(value["resolved_at"].is_null());
        assert!(value["resolved_by"].is_null());
        assert_eq!(value["workflow_id"], created.workflow_id.as_str());
    }
}
