//! Captcha verification for login requests.

use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::crypto::seal_response;
use crate::gateway::context::GatewayContext;
use crate::gateway::{Outcome, Stage};
use crate::http::response::{ErrorBody, Reply};
use crate::store::SettingsProvider;

pub const CAPTCHA_NOT_ISSUED: &str = "Captcha has not been issued";

pub struct CaptchaStage {
    enabled: bool,
    settings: Arc<dyn SettingsProvider>,
    login_path: String,
    error_message: String,
}

impl CaptchaStage {
    pub fn new(
        enabled: bool,
        settings: Arc<dyn SettingsProvider>,
        login_path: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            enabled,
            settings,
            login_path: login_path.into(),
            error_message: error_message.into(),
        }
    }

    /// `{"code":"400","msg":..}`, sealed for the client when encryption is on.
    fn error_reply(&self, ctx: &GatewayContext, status: StatusCode, msg: &str) -> Reply {
        let body = ErrorBody { code: "400", msg }.to_json();
        if !self.settings.payload_encryption_enabled() {
            return Reply::json(status, body);
        }

        let Some(public_key) = ctx.client_public_key.as_deref() else {
            warn!(request_id = %ctx.request_id, "No client public key, replying in plaintext");
            return Reply::json(status, body);
        };
        match seal_response(&body, public_key) {
            Ok(sealed) => Reply::json(status, sealed),
            Err(e) => {
                error!(request_id = %ctx.request_id, error = %e, "Encrypting captcha reply failed");
                Reply::json(status, body)
            }
        }
    }
}

impl Stage for CaptchaStage {
    fn name(&self) -> &'static str {
        "captcha"
    }

    fn apply(&self, ctx: GatewayContext) -> Outcome {
        if !self.enabled || !ctx.is_login_attempt(&self.login_path) {
            return Outcome::Continue(ctx);
        }

        let Some(expected) = ctx.session.captcha_code.as_deref() else {
            warn!(request_id = %ctx.request_id, session_id = %ctx.session.id, "Login without an issued captcha");
            return Outcome::Respond(self.error_reply(&ctx, StatusCode::BAD_REQUEST, CAPTCHA_NOT_ISSUED));
        };
        let submitted = ctx.params.get("captcha").unwrap_or_default();

        if expected.to_lowercase() == submitted.to_lowercase() {
            return Outcome::Continue(ctx);
        }

        info!(request_id = %ctx.request_id, session_id = %ctx.session.id, "Captcha mismatch");
        Outcome::Respond(self.error_reply(&ctx, StatusCode::OK, &self.error_message))
    }
}
