//! RSA key handling for wrapping AES keys.
//!
//! Encryption uses PKCS#1 v1.5 padding, matching what browser-side RSA
//! libraries emit by default.

use std::fs;
use std::path::Path;

use ::rsa::pkcs1::DecodeRsaPublicKey;
use ::rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use ::rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use super::CryptoError;

/// An RSA keypair. The gateway holds one for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RsaKeyPair {
    /// Generate a new keypair with the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), bits)?;
        Ok(Self::from_private(private))
    }

    /// Parse a PKCS#8 PEM private key.
    pub fn from_pkcs8_pem(pem: &str) -> Result<Self, CryptoError> {
        let private =
            RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::Key(e.to_string()))?;
        Ok(Self::from_private(private))
    }

    /// Load a PKCS#8 PEM private key from disk.
    pub fn load(path: &Path) -> Result<Self, CryptoError> {
        let pem = fs::read_to_string(path)
            .map_err(|e| CryptoError::Key(format!("{}: {}", path.display(), e)))?;
        Self::from_pkcs8_pem(&pem)
    }

    fn from_private(private: RsaPrivateKey) -> Self {
        let public = RsaPublicKey::from(&private);
        Self { private, public }
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public
    }

    /// Public key as base64 SubjectPublicKeyInfo DER, the form clients import.
    pub fn public_key_base64(&self) -> Result<String, CryptoError> {
        let der = self
            .public
            .to_public_key_der()
            .map_err(|e| CryptoError::Key(e.to_string()))?;
        Ok(BASE64.encode(der.as_bytes()))
    }

    pub fn public_key_pem(&self) -> Result<String, CryptoError> {
        self.public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CryptoError::Key(e.to_string()))
    }

    pub fn private_key_pem(&self) -> Result<String, CryptoError> {
        self.private
            .to_pkcs8_pem(LineEnding::LF)
            .map(|pem| pem.to_string())
            .map_err(|e| CryptoError::Key(e.to_string()))
    }

    /// Unwrap bytes encrypted under this keypair's public key.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(self.private.decrypt(Pkcs1v15Encrypt, ciphertext)?)
    }
}

/// Parse a client public key: PEM, base64 SPKI DER, or base64 PKCS#1 DER.
pub fn parse_public_key(encoded: &str) -> Result<RsaPublicKey, CryptoError> {
    let encoded = encoded.trim();
    if encoded.starts_with("-----BEGIN RSA PUBLIC KEY") {
        return RsaPublicKey::from_pkcs1_pem(encoded).map_err(|e| CryptoError::Key(e.to_string()));
    }
    if encoded.starts_with("-----BEGIN") {
        return RsaPublicKey::from_public_key_pem(encoded)
            .map_err(|e| CryptoError::Key(e.to_string()));
    }

    let der = BASE64.decode(encoded)?;
    RsaPublicKey::from_public_key_der(&der)
        .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
        .map_err(|e| CryptoError::Key(e.to_string()))
}

/// Encrypt `plaintext` for the holder of `public`.
pub fn encrypt_for(public: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    Ok(public.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, plaintext)?)
}
