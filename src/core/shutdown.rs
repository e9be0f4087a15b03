//! Stop signal for background tasks
//!
//! Consume pumps and queue handler pools run as detached tokio tasks. Each owns
//! a `ShutdownCoordinator`; the owning handle triggers it to make the tasks exit
//! at their next suspension point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coordinates stopping a group of background tasks
#[derive(Clone)]
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            shutdown_tx,
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Subscribe to shutdown notifications
    ///
    /// Subscribe before spawning the task that waits on the receiver: a
    /// trigger that happens earlier is only visible through
    /// [`is_shutdown_requested`](Self::is_shutdown_requested).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Trigger shutdown; repeated calls are harmless
    pub fn trigger_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::Release);
        let _ = self.shutdown_tx.send(());
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::Acquire)
    }

    /// Resolve once shutdown has been requested through `receiver`
    ///
    /// Also resolves if the coordinator is gone or the receiver lagged, both of
    /// which can only happen after a trigger.
    pub async fn wait(&self, receiver: &mut broadcast::Receiver<()>) {
        if self.is_shutdown_requested() {
            return;
        }
        let _ = receiver.recv().await;
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_shutdown_coordinator_creation() {
        let coordinator = ShutdownCoordinator::new();
        assert!(!coordinator.is_shutdown_requested());
    }

    #[tokio::test]
    async fn test_shutdown_coordinator_trigger() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();

        coordinator.trigger_shutdown();

        assert!(coordinator.is_shutdown_requested());
        let signal_received = timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(signal_received.is_ok(), "Should receive shutdown signal");
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let coordinator = ShutdownCoordinator::new();
        let clone = coordinator.clone();
        let mut rx = clone.subscribe();

        coordinator.trigger_shutdown();

        assert!(clone.is_shutdown_requested());
        assert!(timeout(Duration::from_millis(100), clone.wait(&mut rx))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_wait_returns_after_early_trigger() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger_shutdown();

        // Subscribed after the trigger: the flag still releases the waiter
        let mut late_rx = coordinator.subscribe();
        let waited = timeout(Duration::from_millis(100), coordinator.wait(&mut late_rx)).await;
        assert!(waited.is_ok());
    }

    #[tokio::test]
    async fn test_wait_blocks_without_trigger() {
        let coordinator = ShutdownCoordinator::new();
        let mut rx = coordinator.subscribe();

        let waited = timeout(Duration::from_millis(50), coordinator.wait(&mut rx)).await;
        assert!(waited.is_err());
    }
}
