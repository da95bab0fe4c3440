// Approval Workflows Library - human-in-the-loop approval tracking
// Exposes the workflow core plus the service and CLI layers built on it

pub mod cli;
pub mod config;
pub mod observability;
pub mod service;
pub mod shutdown;
pub mod sweeper;
pub mod telemetry;
pub mod workflow;

// Re-export key types for easy access
pub use config::ApprovalConfig;
pub use observability::{WorkflowMetrics, WorkflowMetricsSnapshot};
pub use service::{
    CreateWorkflowRequest, CreateWorkflowResponse, ReviewRequest, WorkflowDetailResponse,
    WorkflowService,
};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflow::{
    Clock, ManualClock, ReviewDecision, SystemClock, Transition, WorkflowContext, WorkflowError,
    WorkflowId, WorkflowRecord, WorkflowStatus, WorkflowStore, SYSTEM_RESOLVER,
};
