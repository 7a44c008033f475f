//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, path shapes and key sizes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use axum::http::HeaderName;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::new("listener.max_body_bytes", "must be greater than 0"));
    }
    if config.upstream.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "upstream.address",
            format!("'{}' is not a socket address", config.upstream.address),
        ));
    }

    let context = &config.security.context_path;
    if !context.is_empty() && (!context.starts_with('/') || context.ends_with('/')) {
        errors.push(ValidationError::new(
            "security.context_path",
            "must be empty or start with '/' and not end with '/'",
        ));
    }
    for (field, path) in [
        ("security.login_path", &config.security.login_path),
        ("security.logout_path", &config.security.logout_path),
        ("security.public_key_path", &config.security.public_key_path),
        ("security.captcha_path", &config.security.captcha_path),
    ] {
        if !path.starts_with('/') {
            errors.push(ValidationError::new(field, "must start with '/'"));
        }
    }

    if !(1..=16).contains(&config.captcha.code_length) {
        errors.push(ValidationError::new("captcha.code_length", "must be between 1 and 16"));
    }

    if config.session.cookie_name.is_empty() {
        errors.push(ValidationError::new("session.cookie_name", "must not be empty"));
    }
    if config.session.idle_timeout_secs == 0 {
        errors.push(ValidationError::new("session.idle_timeout_secs", "must be greater than 0"));
    }
    if config.session.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("session.sweep_interval_secs", "must be greater than 0"));
    }
    if HeaderName::from_bytes(config.session.principal_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "session.principal_header",
            format!("'{}' is not a header name", config.session.principal_header),
        ));
    }
    if config.encryption.private_key_path.is_none() && config.encryption.key_bits < 1024 {
        errors.push(ValidationError::new("encryption.key_bits", "must be at least 1024"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.upstream.address = "not-an-address".into();
        config.security.context_path = "admin/".into();
        config.security.login_path = "login".into();
        config.session.idle_timeout_secs = 0;
        config.session.principal_header = "bad header".into();
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "upstream.address",
                "security.context_path",
                "security.login_path",
                "session.idle_timeout_secs",
                "session.principal_header",
                "timeouts.request_secs",
            ]
        );
    }
}
