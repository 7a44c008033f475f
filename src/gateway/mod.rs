//! Login gateway pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware.rs (resolve session, read cookies, buffer login body)
//!     → session_check.rs (stale session? remember-me recovery)
//!     → access.rs (stale + private URL + no token → forced sign-out)
//!     → decrypt.rs (login POST + encryption on → substitute parameters)
//!     → captcha.rs (login POST + captcha on → compare codes)
//!     → verify_code.rs (captcha endpoint → issue code, answer with image)
//!     → next handler (upstream forwarder)
//!     → middleware.rs (accepted login → new session; logout → drop session)
//! ```
//!
//! # Design Decisions
//! - Each stage takes the context by value and either hands it on or replies
//! - Two stages can reply: access (HTML redirect) and captcha (JSON error)
//! - Stages are synchronous; the only await points live in the middleware

pub mod access;
pub mod allow_list;
pub mod captcha;
pub mod context;
pub mod decrypt;
pub mod middleware;
pub mod session_check;
pub mod verify_code;

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::crypto::RsaKeyPair;
use crate::http::response::Reply;
use crate::store::Services;

pub use access::AccessStage;
pub use allow_list::AllowList;
pub use captcha::CaptchaStage;
pub use context::{strip_context, DecryptedParams, GatewayContext};
pub use decrypt::DecryptStage;
pub use middleware::{gateway_middleware, GatewayState};
pub use session_check::SessionConsistencyStage;

/// Result of running a stage.
pub enum Outcome {
    /// Hand the (possibly updated) context to the next stage.
    Continue(GatewayContext),
    /// Stop and send this reply.
    Respond(Reply),
}

/// One step of the pipeline.
pub trait Stage: Send + Sync {
    /// Label used in logs and metrics.
    fn name(&self) -> &'static str;

    fn apply(&self, ctx: GatewayContext) -> Outcome;
}

/// Ordered list of stages.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Session check, access check, decryption, captcha.
    pub fn standard(config: &GatewayConfig, services: &Services, keys: Arc<RsaKeyPair>) -> Self {
        let security = &config.security;
        let logout_url = format!("{}{}", security.context_path, security.logout_path);

        Self::new(vec![
            Box::new(SessionConsistencyStage::new(
                services.registry.clone(),
                services.remember_me.clone(),
                services.users.clone(),
            )),
            Box::new(AccessStage::new(AllowList::new(&security.public_urls), logout_url)),
            Box::new(DecryptStage::new(
                keys,
                services.settings.clone(),
                security.login_path.clone(),
                config.encryption.reject_undecryptable,
            )),
            Box::new(CaptchaStage::new(
                config.captcha.enabled,
                services.settings.clone(),
                security.login_path.clone(),
                config.captcha.error_message.clone(),
            )),
        ])
    }

    /// Run every stage in order, stopping at the first reply.
    pub fn run(&self, mut ctx: GatewayContext) -> Outcome {
        for stage in &self.stages {
            match stage.apply(ctx) {
                Outcome::Continue(next) => ctx = next,
                Outcome::Respond(reply) => {
                    tracing::debug!(stage = stage.name(), "Pipeline short-circuited");
                    crate::observability::metrics::record_short_circuit(stage.name());
                    return Outcome::Respond(reply);
                }
            }
        }
        Outcome::Continue(ctx)
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Session;
    use axum::http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    impl Stage for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn apply(&self, ctx: GatewayContext) -> Outcome {
            self.0.fetch_add(1, Ordering::SeqCst);
            Outcome::Continue(ctx)
        }
    }

    struct Stop;

    impl Stage for Stop {
        fn name(&self) -> &'static str {
            "stop"
        }

        fn apply(&self, _ctx: GatewayContext) -> Outcome {
            Outcome::Respond(Reply::forced_logout("/logout"))
        }
    }

    #[test]
    fn test_short_circuit_skips_later_stages() {
        let calls = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new(vec![
            Box::new(Counting(calls.clone())),
            Box::new(Stop),
            Box::new(Counting(calls.clone())),
        ]);

        let ctx = GatewayContext::new(Method::GET, "/", Session::new("s1"));
        assert!(matches!(pipeline.run(ctx), Outcome::Respond(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_standard_order() {
        let config = GatewayConfig::default();
        let services = Services::in_memory(&config);
        let keys = Arc::new(RsaKeyPair::generate(1024).unwrap());
        let pipeline = Pipeline::standard(&config, &services, keys);
        assert_eq!(
            pipeline.stage_names(),
            vec!["session_consistency", "access", "decrypt", "captcha"]
        );
    }
}
