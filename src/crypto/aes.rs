//! AES-GCM with string keys.
//!
//! Keys travel as ASCII strings (16 chars for AES-128, 32 for AES-256).
//! Ciphertext is `base64(nonce || ciphertext || tag)`.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::CryptoError;

const NONCE_LEN: usize = 12;
const RESPONSE_KEY_LEN: usize = 16;

/// Generate a fresh random key string for one response.
pub fn generate_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESPONSE_KEY_LEN)
        .map(char::from)
        .collect()
}

/// Encrypt `plaintext` under `key`, returning base64 text.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CryptoError> {
    let key = key.as_bytes();
    let sealed = match key.len() {
        16 => seal::<Aes128Gcm>(key, plaintext.as_bytes())?,
        32 => seal::<Aes256Gcm>(key, plaintext.as_bytes())?,
        n => return Err(CryptoError::AesKeyLength(n)),
    };
    Ok(BASE64.encode(sealed))
}

/// Decrypt base64 `data` under `key` into a UTF-8 string.
pub fn decrypt(data: &str, key: &str) -> Result<String, CryptoError> {
    let bytes = BASE64.decode(data.trim())?;
    let key = key.as_bytes();
    let plain = match key.len() {
        16 => open::<Aes128Gcm>(key, &bytes)?,
        32 => open::<Aes256Gcm>(key, &bytes)?,
        n => return Err(CryptoError::AesKeyLength(n)),
    };
    Ok(String::from_utf8(plain)?)
}

fn seal<C: Aead + AeadCore + KeyInit>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::AesKeyLength(key.len()))?;
    let nonce = C::generate_nonce(&mut OsRng);
    let ciphertext = cipher.encrypt(&nonce, plaintext).map_err(|_| CryptoError::Cipher)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

fn open<C: Aead + KeyInit>(key: &[u8], bytes: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if bytes.len() < NONCE_LEN {
        return Err(CryptoError::Truncated);
    }
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::AesKeyLength(key.len()))?;
    let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
    cipher
        .decrypt(GenericArray::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Cipher)
}
