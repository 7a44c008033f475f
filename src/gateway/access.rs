//! Forced sign-out for stale sessions outside the allow-list.

use tracing::info;

use crate::gateway::allow_list::AllowList;
use crate::gateway::context::GatewayContext;
use crate::gateway::{Outcome, Stage};
use crate::http::response::Reply;

pub struct AccessStage {
    allow_list: AllowList,
    logout_url: String,
}

impl AccessStage {
    /// `logout_url` is the full browser-facing URL, context prefix included.
    pub fn new(allow_list: AllowList, logout_url: impl Into<String>) -> Self {
        Self {
            allow_list,
            logout_url: logout_url.into(),
        }
    }
}

impl Stage for AccessStage {
    fn name(&self) -> &'static str {
        "access"
    }

    fn apply(&self, ctx: GatewayContext) -> Outcome {
        if !ctx.stale_session || ctx.remember_me.is_some() || self.allow_list.is_public(&ctx.path) {
            return Outcome::Continue(ctx);
        }

        info!(
            request_id = %ctx.request_id,
            session_id = %ctx.session.id,
            path = %ctx.path,
            "Session no longer registered, forcing sign-out"
        );
        Outcome::Respond(Reply::forced_logout(self.logout_url.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{RememberMeToken, Session};
    use axum::http::Method;

    fn stage() -> AccessStage {
        AccessStage::new(AllowList::new(["/login", "/common/**"]), "/admin/logout")
    }

    fn stale(path: &str) -> GatewayContext {
        let mut ctx = GatewayContext::new(Method::GET, path, Session::new("s1"));
        ctx.stale_session = true;
        ctx
    }

    #[test]
    fn test_stale_private_url_is_signed_out() {
        match stage().apply(stale("/user/list")) {
            Outcome::Respond(reply) => assert_eq!(
                reply.body(),
                "<script type='text/javascript'>window.location.href = '/admin/logout'</script>"
            ),
            Outcome::Continue(_) => panic!("expected forced logout"),
        }
    }

    #[test]
    fn test_public_url_passes() {
        assert!(matches!(stage().apply(stale("/common/app.js")), Outcome::Continue(_)));
    }

    #[test]
    fn test_remember_me_passes() {
        let mut ctx = stale("/user/list");
        ctx.remember_me = Some(RememberMeToken::new("s", "sa", "t"));
        assert!(matches!(stage().apply(ctx), Outcome::Continue(_)));
    }

    #[test]
    fn test_fresh_session_passes() {
        let ctx = GatewayContext::new(Method::GET, "/user/list", Session::new("s1"));
        assert!(matches!(stage().apply(ctx), Outcome::Continue(_)));
    }
}
