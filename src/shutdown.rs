use anyhow::Result;
use tokio::sync::watch;
use tracing::{info, warn};

/// Graceful shutdown coordinator.
///
/// Background tasks hold a [`ShutdownSignal`] and stop once it fires.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    sender: watch::Sender<bool>,
}

/// Receiving half handed to background tasks
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self { sender }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Fire the shutdown signal for every subscriber
    pub fn trigger(&self) {
        self.sender.send_replace(true);
        info!("Shutdown requested");
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Trigger shutdown when the process receives Ctrl-C
    pub fn install_signal_handler(&self) -> Result<()> {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    sender.send_replace(true);
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        });
        Ok(())
    }
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolve once shutdown has been requested
    pub async fn wait(&mut self) {
        // An error means the coordinator is gone, which is also a shutdown.
        let _ = self.receiver.wait_for(|triggered| *triggered).await;
    }
}
