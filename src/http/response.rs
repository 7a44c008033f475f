//! Short-circuit responses produced by the gateway.
//!
//! # Responsibilities
//! - Render the forced sign-out script page
//! - Render JSON error bodies (plain or encrypted envelope)
//! - Attach or expire the session cookie
//! - Read cookies the upstream sets on its responses
//!
//! # Design Decisions
//! - Replies are plain values so stages stay testable without a server
//! - Business errors keep HTTP 200 and carry their code in the body

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// A response that ends the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// HTML page that sends the browser to the logout endpoint.
    ForcedLogout { logout_url: String },
    /// JSON body, already serialized (and possibly encrypted).
    Json { status: StatusCode, body: String },
}

impl Reply {
    pub fn forced_logout(logout_url: impl Into<String>) -> Self {
        Reply::ForcedLogout {
            logout_url: logout_url.into(),
        }
    }

    pub fn json(status: StatusCode, body: impl Into<String>) -> Self {
        Reply::Json {
            status,
            body: body.into(),
        }
    }

    /// Body text exactly as it will be written.
    pub fn body(&self) -> String {
        match self {
            Reply::ForcedLogout { logout_url } => logout_script(logout_url),
            Reply::Json { body, .. } => body.clone(),
        }
    }
}

/// `<script>` that redirects the browser to `logout_url`.
pub fn logout_script(logout_url: &str) -> String {
    format!(
        "<script type='text/javascript'>window.location.href = '{}'</script>",
        logout_url
    )
}

/// Fixed-shape error payload `{"code":..,"msg":..}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: &'a str,
    pub msg: &'a str,
}

impl ErrorBody<'_> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let (status, content_type) = match &self {
            Reply::ForcedLogout { .. } => (StatusCode::OK, "text/html;charset=UTF-8"),
            Reply::Json { status, .. } => (*status, "application/json; charset=utf-8"),
        };
        let mut response = Response::new(Body::from(self.body()));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        response
    }
}

/// Add a `Set-Cookie` for a newly created session.
pub fn with_session_cookie(response: Response, name: &str, id: &str, path: &str) -> Response {
    append_cookie(response, format!("{}={}; Path={}; HttpOnly", name, id, path))
}

/// Add a `Set-Cookie` that deletes the session cookie.
pub fn with_expired_session_cookie(response: Response, name: &str, path: &str) -> Response {
    append_cookie(response, format!("{}=; Path={}; Max-Age=0; HttpOnly", name, path))
}

fn append_cookie(mut response: Response, cookie: String) -> Response {
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Session cookie not representable as a header"),
    }
    response
}

/// Value of cookie `name` from the `Set-Cookie` headers in `headers`.
///
/// Empty values (cookie deletions) are ignored.
pub fn set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| {
            let pair = cookie.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
        .find(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logout_script_body() {
        let reply = Reply::forced_logout("/admin/logout");
        assert_eq!(
            reply.body(),
            "<script type='text/javascript'>window.location.href = '/admin/logout'</script>"
        );

        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html;charset=UTF-8"
        );
    }

    #[test]
    fn test_error_body_field_order() {
        let body = ErrorBody { code: "400", msg: "bad" }.to_json();
        assert_eq!(body, r#"{"code":"400","msg":"bad"}"#);
    }

    #[test]
    fn test_session_cookie_header() {
        let response = with_session_cookie(
            Reply::json(StatusCode::OK, "{}").into_response(),
            "SESSION",
            "abc",
            "/",
        );
        assert_eq!(
            response.headers().get(header::SET_COOKIE).unwrap(),
            "SESSION=abc; Path=/; HttpOnly"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_expired_session_cookie() {
        let response = with_expired_session_cookie(
            Reply::json(StatusCode::OK, "{}").into_response(),
            "SESSION",
            "/admin",
        );
        assert_eq!(
            response.headers().get(header::SET_COOKIE).unwrap(),
            "SESSION=; Path=/admin; Max-Age=0; HttpOnly"
        );
    }

    #[test]
    fn test_set_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.append(header::SET_COOKIE, HeaderValue::from_static("JSESSIONID=x; Path=/"));
        headers.append(header::SET_COOKIE, HeaderValue::from_static("remember-me=; Max-Age=0"));
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("remember-me=c2VyaWVzOnRva2Vu; Max-Age=1209600; Path=/"),
        );

        assert_eq!(
            set_cookie_value(&headers, "remember-me").as_deref(),
            Some("c2VyaWVzOnRva2Vu")
        );
        assert!(set_cookie_value(&headers, "other").is_none());
    }
}
