//! Registry of sessions the server considers logged in.

use dashmap::DashMap;
use std::sync::Arc;

use crate::store::users::Principal;

/// Maps session id → authenticated principal.
///
/// At most one principal per session id; `register` is an upsert.
pub trait SessionRegistry: Send + Sync {
    fn principal(&self, session_id: &str) -> Option<Principal>;

    fn register(&self, session_id: &str, principal: Principal);

    fn remove(&self, session_id: &str);
}

#[derive(Clone, Default)]
pub struct InMemorySessionRegistry {
    inner: Arc<DashMap<String, Principal>>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl SessionRegistry for InMemorySessionRegistry {
    fn principal(&self, session_id: &str) -> Option<Principal> {
        self.inner.get(session_id).map(|r| r.value().clone())
    }

    fn register(&self, session_id: &str, principal: Principal) {
        self.inner.insert(session_id.to_string(), principal);
    }

    fn remove(&self, session_id: &str) {
        self.inner.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_upsert() {
        let registry = InMemorySessionRegistry::new();
        assert!(registry.principal("s1").is_none());

        registry.register("s1", Principal::new("alice"));
        registry.register("s1", Principal::new("bob"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.principal("s1").unwrap().username, "bob");

        registry.remove("s1");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = InMemorySessionRegistry::new();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    registry.register(&format!("s{}", i % 4), Principal::new("sa"));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 4);
    }
}
