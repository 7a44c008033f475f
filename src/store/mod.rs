//! External collaborators consulted by the gateway.
//!
//! # Responsibilities
//! - Sessions (captcha code, security-context marker)
//! - Session registry (session id → logged-in principal)
//! - Remember-me tokens (series → persisted token)
//! - User lookup and system settings
//! - Idle session eviction (sweeper.rs)
//!
//! # Design Decisions
//! - Each collaborator is a trait so deployments can back it with their own storage
//! - In-memory implementations use DashMap for concurrent upserts
//! - Calls are synchronous; none of them block on I/O in the reference implementations

pub mod registry;
pub mod remember_me;
pub mod sessions;
pub mod settings;
pub mod sweeper;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;

pub use registry::{InMemorySessionRegistry, SessionRegistry};
pub use remember_me::{
    parse_cookie, series_from_cookie, InMemoryRememberMeStore, RememberMeStore, RememberMeToken,
};
pub use sessions::{InMemorySessionStore, SecurityContext, Session, SessionStore};
pub use settings::{SettingsProvider, SystemSettings};
pub use sweeper::SessionSweeper;
pub use users::{InMemoryUserLoader, Principal, UserLoader};

/// Handles to every collaborator, shared by the pipeline stages.
#[derive(Clone)]
pub struct Services {
    pub sessions: Arc<dyn SessionStore>,
    pub registry: Arc<dyn SessionRegistry>,
    pub remember_me: Arc<dyn RememberMeStore>,
    pub users: Arc<dyn UserLoader>,
    pub settings: Arc<dyn SettingsProvider>,
}

impl Services {
    /// Empty in-memory collaborators.
    pub fn in_memory(config: &GatewayConfig) -> Self {
        let idle_timeout = Duration::from_secs(config.session.idle_timeout_secs);
        Self {
            sessions: Arc::new(InMemorySessionStore::with_idle_timeout(idle_timeout)),
            registry: Arc::new(InMemorySessionRegistry::new()),
            remember_me: Arc::new(InMemoryRememberMeStore::new()),
            users: Arc::new(InMemoryUserLoader::new()),
            settings: Arc::new(SystemSettings::new(config.encryption.enabled)),
        }
    }
}
