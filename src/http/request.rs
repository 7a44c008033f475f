//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) and expose it to handlers
//! - Read cookies from the `Cookie` header
//! - Merge query and urlencoded body parameters the way servlet containers do
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body parameters override query parameters with the same name

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use std::collections::HashMap;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Header carrying the request correlation id.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer that assigns a UUID request id when the client did not send one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request id onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Access to the request id assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Value of the first cookie named `name`.
pub fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
}

/// True when the body is an urlencoded form.
pub fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}

/// Content type used when substituted parameters are forwarded.
pub fn form_content_type() -> HeaderValue {
    HeaderValue::from_static("application/x-www-form-urlencoded")
}

/// Flat request parameters (name → first value).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    values: HashMap<String, String>,
}

impl FormParams {
    /// Merge the query string with an urlencoded body; body values win.
    pub fn parse(query: Option<&str>, body: Option<&[u8]>) -> Self {
        let mut params = Self::default();
        if let Some(query) = query {
            params.extend_from(url::form_urlencoded::parse(query.as_bytes()));
        }
        if let Some(body) = body {
            params.extend_from(url::form_urlencoded::parse(body));
        }
        params
    }

    fn extend_from<'a>(&mut self, pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>) {
        let mut seen = std::collections::HashSet::new();
        for (name, value) in pairs {
            // First occurrence within one source wins, as with getParameter.
            if seen.insert(name.to_string()) {
                self.values.insert(name.into_owned(), value.into_owned());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serialize as an urlencoded body, names sorted for stable output.
    pub fn to_form_body(&self) -> String {
        let mut pairs: Vec<_> = self.iter().collect();
        pairs.sort();
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish()
    }
}

impl FromIterator<(String, String)> for FormParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_lookup() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; SESSION=abc"));
        headers.append(header::COOKIE, HeaderValue::from_static("remember-me=\"xyz\""));

        assert_eq!(cookie(&headers, "SESSION").as_deref(), Some("abc"));
        assert_eq!(cookie(&headers, "remember-me").as_deref(), Some("xyz"));
        assert!(cookie(&headers, "missing").is_none());
    }

    #[test]
    fn test_body_overrides_query() {
        let params = FormParams::parse(
            Some("captcha=query&lang=en"),
            Some(b"captcha=AB12&username=sa&username=other"),
        );
        assert_eq!(params.get("captcha"), Some("AB12"));
        assert_eq!(params.get("lang"), Some("en"));
        assert_eq!(params.get("username"), Some("sa"));
    }

    #[test]
    fn test_form_body_encoding() {
        let params: FormParams = vec![
            ("username".to_string(), "sa".to_string()),
            ("password".to_string(), "a b&c".to_string()),
        ]
        .into_iter()
        .collect();

        let body = params.to_form_body();
        assert_eq!(body, "password=a+b%26c&username=sa");
        assert_eq!(FormParams::parse(None, Some(body.as_bytes())), params);
    }

    #[test]
    fn test_request_id_fallback() {
        let req = Request::builder().body(()).unwrap();
        assert_eq!(req.request_id(), "unknown");
    }
}
