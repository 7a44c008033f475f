//! Login gateway library.
//!
//! Sits in front of a login endpoint and, on every request, signs out
//! stale sessions (unless a remember-me token revives them), decrypts
//! hybrid-encrypted login payloads and checks the login captcha.

pub mod config;
pub mod crypto;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
