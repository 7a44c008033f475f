//! URLs reachable without a tracked login.
//!
//! # Design Decisions
//! - Patterns are compiled once at startup
//! - Three shapes: exact (`/login`), subtree (`/common/**`), segment prefix (`/static/app*`)
//! - No regex to keep matching linear in the number of patterns

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    Exact(String),
    Subtree(String),
    Prefix(String),
}

impl Pattern {
    fn parse(raw: &str) -> Self {
        if let Some(base) = raw.strip_suffix("/**") {
            Pattern::Subtree(base.to_string())
        } else if let Some(prefix) = raw.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else {
            Pattern::Exact(raw.to_string())
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            Pattern::Exact(p) => path == p,
            Pattern::Subtree(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Pattern::Prefix(prefix) => path
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| !rest.contains('/')),
        }
    }
}

/// Compiled allow-list.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    patterns: Vec<Pattern>,
}

impl AllowList {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns.into_iter().map(|p| Pattern::parse(p.as_ref())).collect(),
        }
    }

    /// True if `path` (context prefix already stripped) may be accessed unauthenticated.
    pub fn is_public(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}
