//! Persistent remember-me tokens.
//!
//! The cookie value is `base64(series ":" token)`; trailing `=` padding
//! may be stripped by the client.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// A persisted remember-me login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberMeToken {
    pub series: String,
    pub username: String,
    pub token_value: String,
    /// Last use (seconds since epoch).
    pub last_used: u64,
}

impl RememberMeToken {
    pub fn new(series: impl Into<String>, username: impl Into<String>, token_value: impl Into<String>) -> Self {
        let last_used = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            series: series.into(),
            username: username.into(),
            token_value: token_value.into(),
            last_used,
        }
    }

    /// Cookie value a client would present for this token.
    pub fn cookie_value(&self) -> String {
        BASE64.encode(format!("{}:{}", self.series, self.token_value))
    }
}

/// Persistent token repository.
pub trait RememberMeStore: Send + Sync {
    fn token_for_series(&self, series: &str) -> Option<RememberMeToken>;

    /// Store a token issued at login; an existing series is replaced.
    fn create(&self, token: RememberMeToken);

    /// Forget every token belonging to `username`.
    fn remove_user_tokens(&self, username: &str);
}

/// Extract the series from a remember-me cookie value.
pub fn series_from_cookie(value: &str) -> Option<String> {
    parse_cookie(value).map(|(series, _)| series)
}

/// Split a remember-me cookie value into `(series, token)`.
///
/// Returns `None` for anything that is not base64 of `series:token`.
pub fn parse_cookie(value: &str) -> Option<(String, String)> {
    let mut padded = value.trim().to_string();
    if padded.is_empty() {
        return None;
    }
    while padded.len() % 4 != 0 {
        padded.push('=');
    }

    let decoded = BASE64.decode(padded.as_bytes()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let mut parts = decoded.split(':');
    let series = parts.next().filter(|s| !s.is_empty())?;
    let token = parts.next()?;
    Some((series.to_string(), token.to_string()))
}

#[derive(Clone, Default)]
pub struct InMemoryRememberMeStore {
    tokens: Arc<DashMap<String, RememberMeToken>>,
}

impl InMemoryRememberMeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, token: RememberMeToken) {
        self.tokens.insert(token.series.clone(), token);
    }

    pub fn remove(&self, series: &str) {
        self.tokens.remove(series);
    }
}

impl RememberMeStore for InMemoryRememberMeStore {
    fn token_for_series(&self, series: &str) -> Option<RememberMeToken> {
        self.tokens.get(series).map(|r| r.value().clone())
    }

    fn create(&self, token: RememberMeToken) {
        self.insert(token);
    }

    fn remove_user_tokens(&self, username: &str) {
        self.tokens.retain(|_, token| token.username != username);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_from_cookie() {
        let token = RememberMeToken::new("series-1", "sa", "secret");
        assert_eq!(series_from_cookie(&token.cookie_value()).as_deref(), Some("series-1"));

        let unpadded = token.cookie_value().trim_end_matches('=').to_string();
        assert_eq!(series_from_cookie(&unpadded).as_deref(), Some("series-1"));
    }

    #[test]
    fn test_unparseable_cookie_yields_nothing() {
        assert!(series_from_cookie("").is_none());
        assert!(series_from_cookie("%%%").is_none());
        // base64 of "no-separator"
        assert!(series_from_cookie("bm8tc2VwYXJhdG9y").is_none());
    }

    #[test]
    fn test_store_lookup() {
        let store = InMemoryRememberMeStore::new();
        store.insert(RememberMeToken::new("s1", "sa", "t"));
        assert_eq!(store.token_for_series("s1").unwrap().username, "sa");
        store.remove("s1");
        assert!(store.token_for_series("s1").is_none());
    }

    #[test]
    fn test_remove_user_tokens() {
        let store = InMemoryRememberMeStore::new();
        store.create(RememberMeToken::new("s1", "sa", "t1"));
        store.create(RememberMeToken::new("s2", "sa", "t2"));
        store.create(RememberMeToken::new("s3", "ops", "t3"));

        store.remove_user_tokens("sa");
        assert!(store.token_for_series("s1").is_none());
        assert!(store.token_for_series("s2").is_none());
        assert_eq!(store.token_for_series("s3").unwrap().username, "ops");
    }

    #[test]
    fn test_parse_cookie_keeps_token() {
        let token = RememberMeToken::new("series-1", "sa", "secret");
        assert_eq!(
            parse_cookie(&token.cookie_value()),
            Some(("series-1".to_string(), "secret".to_string()))
        );
    }
}
