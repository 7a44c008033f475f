//! Programmatic stop for a running gateway.
//!
//! `HttpServer::run` listens on one receiver for the HTTP listener and hands a
//! resubscribed one to the session sweeper, so a single `trigger` stops both.

use tokio::sync::broadcast;

/// Broadcast handle that stops the listener and the session sweeper.
///
/// The binary keeps one alive for the lifetime of `main`; integration tests
/// trigger it to tear a gateway down between cases.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver to pass to `HttpServer::run` or `SessionSweeper::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Stop every task subscribed so far. Safe to call with no subscribers.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_and_sweeper_receivers_both_fire() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.subscribe();
        let mut sweeper = listener.resubscribe();
        shutdown.trigger();
        assert!(listener.recv().await.is_ok());
        assert!(sweeper.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers() {
        Shutdown::new().trigger();
    }
}
