//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::crypto::CryptoError;

/// Errors surfaced while starting or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Key material could not be loaded or generated.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// The user loader has no such user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// Socket or file failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Address in the configuration does not parse.
    #[error("invalid address '{0}'")]
    Address(String),
}
