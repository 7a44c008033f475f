//! Stale session detection and remember-me recovery.
//!
//! A session is stale when it still carries a security context but the
//! registry has no principal for it (after a restart, or after a forced
//! sign-out elsewhere). A valid remember-me cookie silently re-registers it.

use std::sync::Arc;
use tracing::{info, warn};

use crate::gateway::context::GatewayContext;
use crate::gateway::{Outcome, Stage};
use crate::observability::metrics;
use crate::store::{series_from_cookie, RememberMeStore, SessionRegistry, UserLoader};

pub struct SessionConsistencyStage {
    registry: Arc<dyn SessionRegistry>,
    remember_me: Arc<dyn RememberMeStore>,
    users: Arc<dyn UserLoader>,
}

impl SessionConsistencyStage {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        remember_me: Arc<dyn RememberMeStore>,
        users: Arc<dyn UserLoader>,
    ) -> Self {
        Self {
            registry,
            remember_me,
            users,
        }
    }
}

impl Stage for SessionConsistencyStage {
    fn name(&self) -> &'static str {
        "session_consistency"
    }

    fn apply(&self, mut ctx: GatewayContext) -> Outcome {
        if self.registry.principal(&ctx.session.id).is_some() || ctx.session.security_context.is_none() {
            return Outcome::Continue(ctx);
        }
        ctx.stale_session = true;

        ctx.remember_me = ctx
            .remember_me_cookie
            .as_deref()
            .and_then(series_from_cookie)
            .and_then(|series| self.remember_me.token_for_series(&series));

        if let Some(token) = &ctx.remember_me {
            info!(
                request_id = %ctx.request_id,
                session_id = %ctx.session.id,
                username = %token.username,
                last_used = token.last_used,
                "Remember-me active, re-registering session"
            );
            match self.users.load_user(&token.username) {
                Ok(principal) => {
                    self.registry.register(&ctx.session.id, principal);
                    metrics::record_session_recovered();
                }
                Err(e) => {
                    warn!(request_id = %ctx.request_id, error = %e, "Remember-me user could not be loaded");
                }
            }
        }

        Outcome::Continue(ctx)
    }
}
