//! Property-based tests for the workflow lifecycle
//!
//! Random operation sequences against a manual clock must never break the
//! status/resolution invariants or let a second outcome overwrite the first.

use approval_workflows::{
    Clock, CreateWorkflowRequest, ManualClock, ReviewRequest, WorkflowContext, WorkflowError,
    WorkflowService, WorkflowStatus, WorkflowStore,
};
use chrono::Duration;
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Get,
    Approve(String),
    Reject(String),
    Advance(u32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Get),
        "[a-z]{1,8}".prop_map(Op::Approve),
        "[a-z]{1,8}".prop_map(Op::Reject),
        (0u32..90).prop_map(Op::Advance),
    ]
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn context_strategy() -> impl Strategy<Value = WorkflowContext> {
    prop::collection::btree_map("[a-z_]{1,10}", json_value(), 0..6)
        .prop_map(|m| m.into_iter().collect())
}

fn setup() -> (WorkflowService, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let store = Arc::new(WorkflowStore::with_clock(clock.clone()));
    (WorkflowService::new(store), clock)
}

proptest! {
    #[test]
    fn prop_creation_is_pending_with_exact_expiry(
        action in "[a-z][a-z-]{0,15}",
        requested_by in "[a-z]{1,10}",
        timeout_minutes in 0i64..100_000,
    ) {
        let (service, clock) = setup();
        let created_at = clock.now();
        let created = service
            .create_workflow(
                CreateWorkflowRequest::new(action, requested_by).with_timeout_minutes(timeout_minutes),
            )
            .unwrap();

        prop_assert_eq!(created.status, WorkflowStatus::Pending);
        prop_assert_eq!(created.expires_at, created_at + Duration::minutes(timeout_minutes));
        prop_assert!(created.expires_at >= created_at);

        let stored = service.store().get(&created.workflow_id).unwrap();
        prop_assert!(stored.resolved_at.is_none());
        prop_assert!(stored.resolved_by.is_none());
    }

    #[test]
    fn prop_negative_timeouts_are_rejected(timeout_minutes in i64::MIN..0) {
        let (service, _clock) = setup();
        let err = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice").with_timeout_minutes(timeout_minutes))
            .unwrap_err();
        let is_validation = matches!(err, WorkflowError::Validation { field: "timeout_minutes", .. });
        prop_assert!(is_validation);
        prop_assert!(service.store().is_empty());
    }

    #[test]
    fn prop_first_resolution_wins(
        timeout_minutes in 0i64..120,
        ops in prop::collection::vec(op_strategy(), 1..24),
    ) {
        let (service, clock) = setup();
        let created = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice").with_timeout_minutes(timeout_minutes))
            .unwrap();
        let id = created.workflow_id.to_string();

        let mut resolved = None;
        for op in ops {
            let result = match op {
                Op::Advance(minutes) => {
                    clock.advance(Duration::minutes(i64::from(minutes)));
                    continue;
                }
                Op::Get => service.get_workflow(&id),
                Op::Approve(by) => service.approve_workflow(&id, ReviewRequest::new(by)),
                Op::Reject(by) => service.reject_workflow(&id, ReviewRequest::new(by)),
            };

            match (resolved.clone(), result) {
                (None, Ok(detail)) => {
                    // Pending status and missing resolution always go together
                    prop_assert_eq!(detail.status == WorkflowStatus::Pending, detail.resolved_at.is_none());
                    prop_assert_eq!(detail.resolved_at.is_none(), detail.resolved_by.is_none());
                    if detail.status == WorkflowStatus::Pending {
                        prop_assert!(clock.now() < detail.expires_at);
                    } else {
                        resolved = Some(detail);
                    }
                }
                (None, Err(e)) => {
                    // Only a review that discovered the expiry can fail before resolution
                    let is_invalid = matches!(e, WorkflowError::InvalidTransition { from: WorkflowStatus::TimedOut, .. });
                    prop_assert!(is_invalid);
                    let detail = service.get_workflow(&id).unwrap();
                    prop_assert_eq!(detail.status, WorkflowStatus::TimedOut);
                    resolved = Some(detail);
                }
                (Some(first), Ok(detail)) => {
                    prop_assert_eq!(first, detail);
                }
                (Some(first), Err(e)) => {
                    let is_invalid = matches!(e, WorkflowError::InvalidTransition { .. });
                    prop_assert!(is_invalid);
                    prop_assert_eq!(first, service.get_workflow(&id).unwrap());
                }
            }
        }
    }

    #[test]
    fn prop_context_passes_through(context in context_strategy(), minutes in 0u32..60) {
        let (service, clock) = setup();
        let created = service
            .create_workflow(CreateWorkflowRequest::new("deploy", "alice").with_context(context.clone()))
            .unwrap();
        let id = created.workflow_id.to_string();

        prop_assert_eq!(&service.get_workflow(&id).unwrap().context, &context);
        clock.advance(Duration::minutes(i64::from(minutes)));
        let _ = service.approve_workflow(&id, ReviewRequest::new("bob"));
        prop_assert_eq!(&service.get_workflow(&id).unwrap().context, &context);
    }

    #[test]
    fn prop_unknown_ids_are_not_found(id in "[a-z0-9-]{1,36}") {
        let (service, _clock) = setup();
        let is_get_nf = matches!(service.get_workflow(&id), Err(WorkflowError::NotFound { .. }));
        prop_assert!(is_get_nf);
        let is_review_nf = matches!(
            service.approve_workflow(&id, ReviewRequest::new("bob")),
            Err(WorkflowError::NotFound { .. })
        );
        prop_assert!(is_review_nf);
    }
}
