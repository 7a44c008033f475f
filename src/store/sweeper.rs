//! Periodic eviction of idle sessions.
//!
//! # Responsibilities
//! - Ask the session store to drop sessions past their idle timeout
//! - Remove the registry entries of evicted sessions

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::observability::metrics;
use crate::store::{SessionRegistry, SessionStore};

pub struct SessionSweeper {
    sessions: Arc<dyn SessionStore>,
    registry: Arc<dyn SessionRegistry>,
    interval: Duration,
}

impl SessionSweeper {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        registry: Arc<dyn SessionRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            sessions,
            registry,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Session sweeper starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Session sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// One eviction pass; returns how many sessions were dropped.
    pub fn sweep(&self) -> usize {
        let evicted = self.sessions.evict_idle();
        for id in &evicted {
            self.registry.remove(id);
        }
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "Evicted idle sessions");
            metrics::record_sessions_evicted(evicted.len());
        }
        evicted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use crate::store::{InMemorySessionRegistry, InMemorySessionStore, Principal};

    #[test]
    fn test_sweep_clears_registry() {
        let sessions = InMemorySessionStore::with_idle_timeout(Duration::ZERO);
        let registry = InMemorySessionRegistry::new();
        let session = sessions.create();
        registry.register(&session.id, Principal::new("sa"));

        let sweeper = SessionSweeper::new(
            Arc::new(sessions.clone()),
            Arc::new(registry.clone()),
            Duration::from_secs(60),
        );
        assert_eq!(sweeper.sweep(), 1);
        assert!(sessions.is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let sessions = InMemorySessionStore::with_idle_timeout(Duration::ZERO);
        sessions.create();
        let shutdown = Shutdown::new();

        let sweeper = SessionSweeper::new(
            Arc::new(sessions.clone()),
            Arc::new(InMemorySessionRegistry::new()),
            Duration::from_millis(10),
        );
        let handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(sessions.is_empty());

        shutdown.trigger();
        handle.await.unwrap();
    }
}
