//! Per-request state threaded through the stages.

use axum::http::Method;

use crate::http::request::FormParams;
use crate::store::{RememberMeToken, Session};

/// Everything the stages know about one request.
#[derive(Debug, Clone)]
pub struct GatewayContext {
    pub request_id: String,
    pub method: Method,
    /// Request path with the context prefix removed.
    pub path: String,
    pub session: Session,
    /// Raw remember-me cookie, if the client sent one.
    pub remember_me_cookie: Option<String>,
    /// Effective request parameters.
    pub params: FormParams,
    /// True once `params` holds decrypted login fields.
    pub decrypted: bool,
    /// Client key for encrypting an error reply.
    pub client_public_key: Option<String>,
    /// Token found while recovering a stale session.
    pub remember_me: Option<RememberMeToken>,
    /// Client holds a security context the registry does not know about.
    pub stale_session: bool,
}

impl GatewayContext {
    pub fn new(method: Method, path: impl Into<String>, session: Session) -> Self {
        Self {
            request_id: "unknown".to_string(),
            method,
            path: path.into(),
            session,
            remember_me_cookie: None,
            params: FormParams::default(),
            decrypted: false,
            client_public_key: None,
            remember_me: None,
            stale_session: false,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_params(mut self, params: FormParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_remember_me_cookie(mut self, cookie: Option<String>) -> Self {
        self.remember_me_cookie = cookie;
        self
    }

    /// `POST` to the login path.
    pub fn is_login_attempt(&self, login_path: &str) -> bool {
        self.method == Method::POST && self.path == login_path
    }
}

/// Remove the leading context prefix from `path`.
///
/// The prefix only matches whole segments: `/administrator` is not under `/admin`.
pub fn strip_context<'a>(path: &'a str, context_path: &str) -> &'a str {
    if context_path.is_empty() {
        return path;
    }
    match path.strip_prefix(context_path) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Parameters substituted by the decryption stage, visible to downstream handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedParams(pub FormParams);
