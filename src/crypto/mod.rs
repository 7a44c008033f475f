//! Hybrid payload cryptography.
//!
//! # Data Flow
//! ```text
//! Login request (client → gateway):
//!     aesKey  → base64 decode → RSA decrypt (server private key) → AES key string
//!     data    → base64 decode → AES-GCM decrypt (AES key)        → JSON object
//!
//! Error response (gateway → client):
//!     fresh AES key → AES-GCM encrypt body
//!     AES key       → RSA encrypt (client publicKey) → base64
//!     → {"data":{"data":..,"aesKey":..}}
//! ```

pub mod aes;
pub mod hybrid;
pub mod rsa;

use thiserror::Error;

pub use hybrid::{open_envelope, open_payload, seal_payload, seal_response, HybridPayload};
pub use self::rsa::RsaKeyPair;

/// Errors raised while wrapping or unwrapping payloads.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("RSA operation failed: {0}")]
    Rsa(#[from] ::rsa::Error),

    #[error("key decoding failed: {0}")]
    Key(String),

    #[error("AES key must be 16 or 32 bytes, got {0}")]
    AesKeyLength(usize),

    #[error("AES ciphertext is shorter than its nonce")]
    Truncated,

    #[error("AES authentication failed")]
    Cipher,

    #[error("decrypted bytes are not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("decrypted payload is not a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),
}
