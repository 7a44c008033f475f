//! User lookup.

use dashmap::DashMap;
use std::sync::Arc;

use crate::error::GatewayError;

/// An authenticated user as tracked by the session registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub authorities: Vec<String>,
}

impl Principal {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            authorities: Vec::new(),
        }
    }

    pub fn with_authorities(mut self, authorities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.authorities = authorities.into_iter().map(Into::into).collect();
        self
    }
}

/// Resolves a username to its principal.
pub trait UserLoader: Send + Sync {
    fn load_user(&self, username: &str) -> Result<Principal, GatewayError>;
}

#[derive(Clone, Default)]
pub struct InMemoryUserLoader {
    users: Arc<DashMap<String, Principal>>,
}

impl InMemoryUserLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.users.insert(principal.username.clone(), principal);
    }
}

impl UserLoader for InMemoryUserLoader {
    fn load_user(&self, username: &str) -> Result<Principal, GatewayError> {
        self.users
            .get(username)
            .map(|r| r.value().clone())
            .ok_or_else(|| GatewayError::UnknownUser(username.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_user() {
        let users = InMemoryUserLoader::new();
        users.insert(Principal::new("sa").with_authorities(["ROLE_SA"]));

        let principal = users.load_user("sa").unwrap();
        assert_eq!(principal.authorities, vec!["ROLE_SA".to_string()]);
        assert!(matches!(
            users.load_user("ghost"),
            Err(GatewayError::UnknownUser(ref name)) if name == "ghost"
        ));
    }
}
