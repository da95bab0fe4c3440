// Optional active expiry sweep. Lazy evaluation on read stays the baseline;
// the sweep only makes timeouts visible in stats without a read.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::shutdown::ShutdownSignal;
use crate::workflow::WorkflowStore;

/// Spawn the sweep loop. Returns `None` when `interval` is zero.
pub fn spawn_sweeper(
    store: Arc<WorkflowStore>,
    interval: Duration,
    mut shutdown: ShutdownSignal,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        debug!("Expiry sweeper disabled");
        return None;
    }

    info!(interval_secs = interval.as_secs_f64(), "Starting expiry sweeper");
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = ticker.tick() => {
                    let expired = store.expire_due();
                    if !expired.is_empty() {
                        info!(count = expired.len(), "Sweeper timed out workflows");
                    }
                }
            }
        }
        info!("Expiry sweeper stopped");
    }))
}
