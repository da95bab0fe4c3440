use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::service::{CreateWorkflowRequest, ReviewRequest, WorkflowService};
use crate::workflow::{ManualClock, WorkflowError, WorkflowStore};

/// Outcome of one scripted step
#[derive(Debug, Clone, Serialize)]
pub struct DemoStep {
    pub step: &'static str,
    pub ok: bool,
    pub result: serde_json::Value,
}

impl DemoStep {
    fn from_result<T: Serialize>(
        step: &'static str,
        result: Result<T, WorkflowError>,
    ) -> Result<Self> {
        Ok(match result {
            Ok(value) => Self {
                step,
                ok: true,
                result: serde_json::to_value(value)?,
            },
            Err(e) => Self {
                step,
                ok: false,
                result: serde_json::json!({ "kind": e.kind(), "message": e.to_string() }),
            },
        })
    }
}

pub struct DemoCommand;

impl DemoCommand {
    pub fn new() -> Self {
        Self
    }

    /// Walk through the reference lifecycle: approve, double review, zero timeout, unknown id
    pub fn run(&self) -> Result<Vec<DemoStep>> {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service = WorkflowService::new(Arc::new(WorkflowStore::with_clock(clock)));
        let mut steps = Vec::new();

        let deploy = service.create_workflow(
            CreateWorkflowRequest::new("deploy", "alice").with_timeout_minutes(30),
        )?;
        let deploy_id = deploy.workflow_id.to_string();
        steps.push(DemoStep::from_result("create deploy (30 min)", Ok(&deploy))?);

        steps.push(DemoStep::from_result(
            "get deploy",
            service.get_workflow(&deploy_id),
        )?);
        steps.push(DemoStep::from_result(
            "approve deploy as bob",
            service.approve_workflow(&deploy_id, ReviewRequest::new("bob")),
        )?);
        steps.push(DemoStep::from_result(
            "reject deploy again",
            service.reject_workflow(&deploy_id, ReviewRequest::new("carol")),
        )?);

        let instant = service.create_workflow(
            CreateWorkflowRequest::new("rotate-keys", "alice").with_timeout_minutes(0),
        )?;
        steps.push(DemoStep::from_result("create rotate-keys (0 min)", Ok(&instant))?);
        steps.push(DemoStep::from_result(
            "get rotate-keys",
            service.get_workflow(instant.workflow_id.as_str()),
        )?);

        steps.push(DemoStep::from_result(
            "get unknown id",
            service.get_workflow(&uuid::Uuid::new_v4().to_string()),
        )?);

        Ok(steps)
    }

    pub fn execute(&self) -> Result<()> {
        let steps = self.run()?;
        println!("{}", serde_json::to_string_pretty(&steps)?);
        Ok(())
    }
}

impl Default for DemoCommand {
    fn default() -> Self {
        Self::new()
    }
}
