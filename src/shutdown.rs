use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Graceful shutdown coordinator for display clients
///
/// Every poll loop holds a receiver; triggering flips the shared flag once
/// and each loop exits after its current tick.
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    pub fn trigger(&self) {
        if !self.is_triggered() {
            info!("Initiating graceful shutdown of display clients");
        }
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Trigger shutdown on Ctrl-C (and SIGTERM on unix).
    pub fn install_signal_handlers(&self) -> JoinHandle<()> {
        info!("Installing signal handlers for graceful shutdown");
        let coordinator = self.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            coordinator.trigger();
        })
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                _ = terminate.recv() => info!("Received SIGTERM"),
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            log_ctrl_c(tokio::signal::ctrl_c().await);
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    log_ctrl_c(tokio::signal::ctrl_c().await);
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl-C"),
        Err(e) => warn!("Failed to listen for Ctrl-C, shutting down: {}", e),
    }
}
