//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the login gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Upstream application that receives accepted requests.
    pub upstream: UpstreamConfig,

    /// Paths and the unauthenticated allow-list.
    pub security: SecurityConfig,

    /// Captcha verification settings.
    pub captcha: CaptchaConfig,

    /// Session and remember-me cookie settings.
    pub session: SessionConfig,

    /// Hybrid payload encryption settings.
    pub encryption: EncryptionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Largest login body the gateway will buffer for decryption.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Upstream server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Paths the gateway recognizes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Servlet-style context prefix stripped from incoming paths (e.g., "/admin").
    pub context_path: String,

    /// Login endpoint, relative to the context path.
    pub login_path: String,

    /// Logout endpoint used by the forced sign-out script.
    pub logout_path: String,

    /// Endpoint serving the server RSA public key.
    pub public_key_path: String,

    /// Endpoint issuing captcha images.
    pub captcha_path: String,

    /// URLs reachable without a tracked login (exact, `/**` or trailing `*`).
    pub public_urls: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            context_path: String::new(),
            login_path: "/login".to_string(),
            logout_path: "/logout".to_string(),
            public_key_path: "/gateway/public-key".to_string(),
            captcha_path: "/getVerifyCodeImage".to_string(),
            public_urls: vec![
                "/login".to_string(),
                "/loginPage".to_string(),
                "/logout".to_string(),
                "/getVerifyCodeImage".to_string(),
                "/gateway/public-key".to_string(),
                "/favicon.ico".to_string(),
                "/common/**".to_string(),
                "/webjars/**".to_string(),
            ],
        }
    }
}

/// Captcha verification settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptchaConfig {
    /// Compare submitted captcha codes on login.
    pub enabled: bool,

    /// Message returned on mismatch.
    pub error_message: String,

    /// Characters per issued code.
    pub code_length: usize,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error_message: "Incorrect verification code".to_string(),
            code_length: 4,
        }
    }
}

/// Session lifetime and cookie names.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie carrying the session id.
    pub cookie_name: String,

    /// Cookie carrying the remember-me series.
    pub remember_me_cookie: String,

    /// Sessions untouched for this long are dropped.
    pub idle_timeout_secs: u64,

    /// How often idle sessions are swept.
    pub sweep_interval_secs: u64,

    /// Response header the upstream sets to the username after a successful login.
    /// The gateway removes it before the response leaves.
    pub principal_header: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "SESSION".to_string(),
            remember_me_cookie: "remember-me".to_string(),
            idle_timeout_secs: 30 * 60,
            sweep_interval_secs: 60,
            principal_header: "x-login-user".to_string(),
        }
    }
}

/// Hybrid payload encryption settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EncryptionConfig {
    /// Initial value of the payload encryption switch.
    pub enabled: bool,

    /// PKCS#8 PEM file holding the server private key.
    /// A key is generated at startup when unset.
    pub private_key_path: Option<String>,

    /// Modulus size for generated keys.
    pub key_bits: usize,

    /// Answer undecryptable login payloads with 400 instead of forwarding them.
    pub reject_undecryptable: bool,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            private_key_path: None,
            key_bits: 2048,
            reject_undecryptable: false,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON log lines.
    pub log_json: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "login_gateway=debug,tower_http=debug".to_string(),
            log_json: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
