//! Axum middleware that runs the pipeline in front of the next handler.
//!
//! Besides the stages, the middleware owns the session lifecycle:
//! - unknown visitors get a transient session that is only stored once written
//! - the captcha endpoint issues a code into the session
//! - a login the upstream accepts moves the client to a fresh, authenticated session
//! - the logout endpoint drops the session, its registry entry and remember-me tokens

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::gateway::context::{strip_context, DecryptedParams, GatewayContext};
use crate::gateway::verify_code;
use crate::gateway::{Outcome, Pipeline};
use crate::http::request::{cookie, form_content_type, is_form, FormParams, RequestIdExt};
use crate::http::response::{
    set_cookie_value, with_expired_session_cookie, with_session_cookie, ErrorBody, Reply,
};
use crate::observability::metrics;
use crate::store::{parse_cookie, Principal, RememberMeToken, SecurityContext, Services, Session};

/// State required by [`gateway_middleware`].
#[derive(Clone)]
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    pub services: Services,
    pub context_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub captcha_path: String,
    pub captcha_enabled: bool,
    pub captcha_length: usize,
    pub session_cookie: String,
    pub remember_me_cookie: String,
    pub principal_header: String,
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig, pipeline: Arc<Pipeline>, services: &Services) -> Self {
        Self {
            pipeline,
            services: services.clone(),
            context_path: config.security.context_path.clone(),
            login_path: config.security.login_path.clone(),
            logout_path: config.security.logout_path.clone(),
            captcha_path: config.security.captcha_path.clone(),
            captcha_enabled: config.captcha.enabled,
            captcha_length: config.captcha.code_length,
            session_cookie: config.session.cookie_name.clone(),
            remember_me_cookie: config.session.remember_me_cookie.clone(),
            principal_header: config.session.principal_header.to_ascii_lowercase(),
            max_body_bytes: config.listener.max_body_bytes,
        }
    }

    fn cookie_path(&self) -> &str {
        if self.context_path.is_empty() {
            "/"
        } else {
            &self.context_path
        }
    }

    /// Store a fresh captcha code and answer with its image.
    fn issue_captcha(&self, existing: Option<Session>, request_id: &str) -> Response {
        let (mut session, created) = match existing {
            Some(session) => (session, false),
            None => (self.services.sessions.create(), true),
        };
        let code = verify_code::generate_code(self.captcha_length);
        session.captcha_code = Some(code.clone());
        let session_id = session.id.clone();
        self.services.sessions.save(session);

        debug!(request_id = %request_id, session_id = %session_id, "Captcha issued");
        metrics::record_captcha_issued();

        let response = verify_code::image_response(&code);
        if created {
            with_session_cookie(response, &self.session_cookie, &session_id, self.cookie_path())
        } else {
            response
        }
    }

    /// Record a login the upstream accepted.
    ///
    /// The client moves to a new session id carrying the security context, the
    /// principal is registered, and a remember-me cookie set by the upstream is
    /// persisted as a token.
    fn record_login(&self, existing: Option<Session>, mut response: Response, request_id: &str) -> Response {
        let Some(value) = response.headers_mut().remove(self.principal_header.as_str()) else {
            return response;
        };
        let username = match value.to_str() {
            Ok(username) if !username.is_empty() => username.to_string(),
            _ => {
                warn!(request_id = %request_id, "Upstream sent an unreadable login principal");
                return response;
            }
        };

        let principal = match self.services.users.load_user(&username) {
            Ok(principal) => principal,
            Err(e) => {
                debug!(request_id = %request_id, error = %e, "Using upstream principal without authorities");
                Principal::new(&username)
            }
        };

        if let Some(old) = existing {
            self.services.registry.remove(&old.id);
            self.services.sessions.invalidate(&old.id);
        }
        let mut session = self.services.sessions.create();
        session.security_context = Some(SecurityContext {
            username: username.clone(),
        });
        let session_id = session.id.clone();
        self.services.sessions.save(session);
        self.services.registry.register(&session_id, principal);

        if let Some((series, token)) =
            set_cookie_value(response.headers(), &self.remember_me_cookie).and_then(|v| parse_cookie(&v))
        {
            self.services
                .remember_me
                .create(RememberMeToken::new(series, username.clone(), token));
        }

        info!(request_id = %request_id, username = %username, session_id = %session_id, "Login recorded");
        metrics::record_login();
        with_session_cookie(response, &self.session_cookie, &session_id, self.cookie_path())
    }

    /// Drop everything tied to the session being logged out.
    fn record_logout(&self, existing: Option<Session>, response: Response, request_id: &str) -> Response {
        let Some(session) = existing else {
            return response;
        };
        self.services.registry.remove(&session.id);
        if let Some(context) = &session.security_context {
            self.services.remember_me.remove_user_tokens(&context.username);
        }
        self.services.sessions.invalidate(&session.id);

        debug!(request_id = %request_id, session_id = %session.id, "Session logged out");
        with_expired_session_cookie(response, &self.session_cookie, self.cookie_path())
    }
}

pub async fn gateway_middleware(
    State(state): State<GatewayState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let (mut parts, body) = request.into_parts();
    let path = strip_context(parts.uri.path(), &state.context_path).to_string();

    // 1. Resolve the session; unknown visitors get an unsaved one
    let existing = cookie(&parts.headers, &state.session_cookie)
        .and_then(|id| state.services.sessions.get(&id));
    let session = existing.clone().unwrap_or_default();

    // 2. Collect parameters; only login bodies are buffered
    let is_login = parts.method == Method::POST && path == state.login_path;
    let (params, body) = if is_login {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(bytes) => {
                let form = is_form(&parts.headers).then_some(bytes.as_ref());
                (FormParams::parse(parts.uri.query(), form), Body::from(bytes))
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Login body rejected");
                let body = ErrorBody {
                    code: "413",
                    msg: "Login payload too large",
                };
                metrics::record_request("rejected", start);
                return Reply::json(StatusCode::PAYLOAD_TOO_LARGE, body.to_json()).into_response();
            }
        }
    } else {
        (FormParams::parse(parts.uri.query(), None), body)
    };

    debug!(
        request_id = %request_id,
        method = %parts.method,
        path = %path,
        session_id = %session.id,
        "Gateway processing request"
    );

    let ctx = GatewayContext::new(parts.method.clone(), path.clone(), session)
        .with_request_id(request_id.clone())
        .with_params(params)
        .with_remember_me_cookie(cookie(&parts.headers, &state.remember_me_cookie));

    // 3. Run the stages, then reply, serve a captcha, or forward
    let ctx = match state.pipeline.run(ctx) {
        Outcome::Respond(reply) => {
            metrics::record_request("short_circuit", start);
            return reply.into_response();
        }
        Outcome::Continue(ctx) => ctx,
    };

    if state.captcha_enabled && parts.method == Method::GET && path == state.captcha_path {
        metrics::record_request("captcha", start);
        return state.issue_captcha(existing, &request_id);
    }

    let body = if ctx.decrypted {
        let form = ctx.params.to_form_body();
        parts.headers.insert(header::CONTENT_TYPE, form_content_type());
        parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(form.len()));
        parts.headers.remove(header::TRANSFER_ENCODING);
        parts.extensions.insert(DecryptedParams(ctx.params));
        Body::from(form)
    } else {
        body
    };
    metrics::record_request("forwarded", start);
    let response = next.run(Request::from_parts(parts, body)).await;

    // 4. Follow login and logout outcomes
    if is_login {
        state.record_login(existing, response, &request_id)
    } else if path == state.logout_path {
        state.record_logout(existing, response, &request_id)
    } else {
        response
    }
}
