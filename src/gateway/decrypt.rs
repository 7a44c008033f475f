//! Hybrid decryption of login requests.
//!
//! When payload encryption is on, a login POST carries `data`, `aesKey` and
//! `publicKey` instead of its real fields. This stage unwraps them so that
//! everything downstream sees an ordinary login form.
//!
//! Failures are logged and the original parameters are kept; the login then
//! fails further down on garbled input. `reject_undecryptable` turns that
//! into an immediate 400 instead.

use axum::http::StatusCode;
use std::sync::Arc;
use tracing::{debug, error};

use crate::crypto::{open_payload, CryptoError, HybridPayload, RsaKeyPair};
use crate::gateway::context::GatewayContext;
use crate::gateway::{Outcome, Stage};
use crate::http::request::FormParams;
use crate::http::response::{ErrorBody, Reply};
use crate::observability::metrics;
use crate::store::SettingsProvider;

pub const MALFORMED_PAYLOAD: &str = "Malformed login payload";

pub struct DecryptStage {
    keys: Arc<RsaKeyPair>,
    settings: Arc<dyn SettingsProvider>,
    login_path: String,
    reject_undecryptable: bool,
}

impl DecryptStage {
    pub fn new(
        keys: Arc<RsaKeyPair>,
        settings: Arc<dyn SettingsProvider>,
        login_path: impl Into<String>,
        reject_undecryptable: bool,
    ) -> Self {
        Self {
            keys,
            settings,
            login_path: login_path.into(),
            reject_undecryptable,
        }
    }

    fn decrypt(&self, params: &FormParams) -> Result<FormParams, CryptoError> {
        let payload = HybridPayload {
            data: params.get("data").ok_or(CryptoError::MissingField("data"))?.to_string(),
            aes_key: params.get("aesKey").ok_or(CryptoError::MissingField("aesKey"))?.to_string(),
            public_key: params.get("publicKey").map(str::to_string),
        };
        Ok(open_payload(&self.keys, &payload)?.into_iter().collect())
    }
}

impl Stage for DecryptStage {
    fn name(&self) -> &'static str {
        "decrypt"
    }

    fn apply(&self, mut ctx: GatewayContext) -> Outcome {
        if !ctx.is_login_attempt(&self.login_path) || !self.settings.payload_encryption_enabled() {
            return Outcome::Continue(ctx);
        }

        ctx.client_public_key = ctx.params.get("publicKey").map(str::to_string);

        match self.decrypt(&ctx.params) {
            Ok(params) => {
                debug!(request_id = %ctx.request_id, fields = params.len(), "Login payload decrypted");
                ctx.params = params;
                ctx.decrypted = true;
            }
            Err(e) => {
                error!(request_id = %ctx.request_id, error = %e, "Login payload decryption failed");
                metrics::record_decrypt_failure();
                if self.reject_undecryptable {
                    let body = ErrorBody {
                        code: "400",
                        msg: MALFORMED_PAYLOAD,
                    };
                    return Outcome::Respond(Reply::json(StatusCode::BAD_REQUEST, body.to_json()));
                }
            }
        }
        Outcome::Continue(ctx)
    }
}
