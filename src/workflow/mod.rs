// Approval workflow lifecycle: entity model, transition rules and the backing store

pub mod clock;
pub mod errors;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::WorkflowError;
pub use store::{StoreStats, Transition, WorkflowStore};
pub use types::{
    compute_expires_at, ReviewDecision, WorkflowContext, WorkflowId, WorkflowRecord,
    WorkflowStatus, SYSTEM_RESOLVER,
};
