//! Server-side HTTP sessions.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Marker left in a session by the authentication layer once a login succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    pub username: String,
}

/// Snapshot of one session's attributes.
///
/// An empty `id` marks a transient session that was never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    /// Code issued by the captcha endpoint, if any.
    pub captcha_code: Option<String>,
    /// Present while the client believes it is logged in.
    pub security_context: Option<SecurityContext>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// Storage for sessions keyed by id.
pub trait SessionStore: Send + Sync {
    /// Look up a live session, refreshing its idle timer.
    fn get(&self, id: &str) -> Option<Session>;

    /// Create and store an empty session with a fresh id.
    fn create(&self) -> Session;

    fn save(&self, session: Session);

    fn invalidate(&self, id: &str);

    /// Drop sessions idle past the store's timeout and return their ids.
    fn evict_idle(&self) -> Vec<String>;
}

struct Entry {
    session: Session,
    last_access: Instant,
}

/// A thread-safe in-memory session store.
///
/// Sessions never expire unless an idle timeout is set.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    inner: Arc<DashMap<String, Entry>>,
    idle_timeout: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::default(),
            idle_timeout: Some(idle_timeout),
        }
    }

    /// Record the captcha code a client must echo back.
    pub fn issue_captcha(&self, id: &str, code: impl Into<String>) {
        if let Some(mut entry) = self.inner.get_mut(id) {
            entry.session.captcha_code = Some(code.into());
        }
    }

    pub fn set_security_context(&self, id: &str, context: Option<SecurityContext>) {
        if let Some(mut entry) = self.inner.get_mut(id) {
            entry.session.security_context = context;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn expired(&self, entry: &Entry) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| entry.last_access.elapsed() >= timeout)
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, id: &str) -> Option<Session> {
        let mut entry = self.inner.get_mut(id)?;
        if self.expired(&entry) {
            return None;
        }
        entry.last_access = Instant::now();
        Some(entry.session.clone())
    }

    fn create(&self) -> Session {
        let session = Session::new(Uuid::new_v4().simple().to_string());
        self.save(session.clone());
        session
    }

    fn save(&self, session: Session) {
        let entry = Entry {
            session,
            last_access: Instant::now(),
        };
        self.inner.insert(entry.session.id.clone(), entry);
    }

    fn invalidate(&self, id: &str) {
        self.inner.remove(id);
    }

    fn evict_idle(&self) -> Vec<String> {
        let mut evicted = Vec::new();
        self.inner.retain(|id, entry| {
            let keep = !self.expired(entry);
            if !keep {
                evicted.push(id.clone());
            }
            keep
        });
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();
        let session = store.create();
        assert_eq!(store.get(&session.id), Some(session.clone()));

        store.issue_captcha(&session.id, "ab12");
        store.set_security_context(
            &session.id,
            Some(SecurityContext {
                username: "sa".into(),
            }),
        );
        let stored = store.get(&session.id).unwrap();
        assert_eq!(stored.captcha_code.as_deref(), Some("ab12"));
        assert_eq!(stored.security_context.unwrap().username, "sa");

        store.invalidate(&session.id);
        assert!(store.get(&session.id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_created_ids_are_unique() {
        let store = InMemorySessionStore::new();
        assert_ne!(store.create().id, store.create().id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let store = InMemorySessionStore::with_idle_timeout(Duration::ZERO);
        let session = store.create();

        assert!(store.get(&session.id).is_none());
        assert_eq!(store.evict_idle(), vec![session.id]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_active_sessions_survive_eviction() {
        let store = InMemorySessionStore::with_idle_timeout(Duration::from_secs(3600));
        let session = store.create();

        assert!(store.evict_idle().is_empty());
        assert!(store.get(&session.id).is_some());

        let unbounded = InMemorySessionStore::new();
        unbounded.create();
        assert!(unbounded.evict_idle().is_empty());
        assert_eq!(unbounded.len(), 1);
    }
}
