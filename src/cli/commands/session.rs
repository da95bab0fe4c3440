// Line-oriented JSON driver for the workflow service

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::ApprovalConfig;
use crate::service::{CreateWorkflowRequest, ReviewRequest, WorkflowService};
use crate::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::sweeper::spawn_sweeper;
use crate::workflow::{WorkflowError, WorkflowStore};

/// One request line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionRequest {
    Create(CreateWorkflowRequest),
    Get { workflow_id: String },
    Approve { workflow_id: String, reviewed_by: String },
    Reject { workflow_id: String, reviewed_by: String },
    Stats,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionError {
    pub kind: String,
    pub message: String,
}

/// One response line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl SessionResponse {
    fn success<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => Self {
                ok: true,
                data: Some(value),
                error: None,
            },
            Err(e) => Self::failure("internal_error", e.to_string()),
        }
    }

    fn failure(kind: &str, message: String) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(SessionError {
                kind: kind.to_string(),
                message,
            }),
        }
    }
}

impl From<WorkflowError> for SessionResponse {
    fn from(err: WorkflowError) -> Self {
        Self::failure(err.kind(), err.to_string())
    }
}

/// Dispatch a single request line against the service
pub fn handle_request_line(service: &WorkflowService, line: &str) -> SessionResponse {
    let request: SessionRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return SessionResponse::failure("parse_error", e.to_string()),
    };
    debug!(?request, "Session request");

    let outcome = match request {
        SessionRequest::Create(create) => service
            .create_workflow(create)
            .map(|r| SessionResponse::success(&r)),
        SessionRequest::Get { workflow_id } => service
            .get_workflow(&workflow_id)
            .map(|r| SessionResponse::success(&r)),
        SessionRequest::Approve {
            workflow_id,
            reviewed_by,
        } => service
            .approve_workflow(&workflow_id, ReviewRequest::new(reviewed_by))
            .map(|r| SessionResponse::success(&r)),
        SessionRequest::Reject {
            workflow_id,
            reviewed_by,
        } => service
            .reject_workflow(&workflow_id, ReviewRequest::new(reviewed_by))
            .map(|r| SessionResponse::success(&r)),
        SessionRequest::Stats => Ok(SessionResponse::success(&service.store().stats())),
    };
    outcome.unwrap_or_else(SessionResponse::from)
}

/// Read requests until EOF or shutdown, writing one response line per non-blank request
pub async fn run_session<R, W>(
    service: &WorkflowService,
    reader: R,
    mut writer: W,
    mut shutdown: ShutdownSignal,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;
    loop {
        let line = tokio::select! {
            _ = shutdown.wait() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_request_line(service, &line);
        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        handled += 1;
    }
    Ok(handled)
}

pub struct SessionCommand {
    pub default_timeout_minutes: u32,
    pub sweep_interval: Duration,
}

impl SessionCommand {
    pub fn from_config(config: &ApprovalConfig) -> Self {
        Self {
            default_timeout_minutes: config.store.default_timeout_minutes,
            sweep_interval: Duration::from_secs(config.store.sweep_interval_seconds),
        }
    }

    pub fn with_default_timeout(mut self, minutes: Option<u32>) -> Self {
        if let Some(minutes) = minutes {
            self.default_timeout_minutes = minutes;
        }
        self
    }

    pub fn with_sweep_interval(mut self, seconds: Option<u64>) -> Self {
        if let Some(seconds) = seconds {
            self.sweep_interval = Duration::from_secs(seconds);
        }
        self
    }

    pub async fn execute(&self) -> Result<()> {
        let store = Arc::new(WorkflowStore::new());
        let service =
            WorkflowService::with_default_timeout(store.clone(), self.default_timeout_minutes);

        let coordinator = ShutdownCoordinator::new();
        coordinator.install_signal_handler()?;
        let sweeper = spawn_sweeper(store.clone(), self.sweep_interval, coordinator.subscribe());

        let handled = run_session(
            &service,
            tokio::io::BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
            coordinator.subscribe(),
        )
        .await?;

        coordinator.trigger();
        if let Some(handle) = sweeper {
            handle.await?;
        }
        store.metrics().log_stats();
        info!(requests = handled, "Session finished");
        Ok(())
    }
}
