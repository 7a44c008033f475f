//! Hybrid (RSA-wrapped AES) payloads and response envelopes.

use ::rsa::RsaPublicKey;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::rsa::{encrypt_for, parse_public_key, RsaKeyPair};
use super::{aes, CryptoError};

/// The three fields of an encrypted login request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HybridPayload {
    /// AES ciphertext of the JSON login form.
    pub data: String,
    /// RSA ciphertext of the AES key string.
    #[serde(rename = "aesKey")]
    pub aes_key: String,
    /// Client public key used to encrypt the reply.
    #[serde(rename = "publicKey", default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    data: SealedBody,
}

#[derive(Debug, Serialize, Deserialize)]
struct SealedBody {
    data: String,
    #[serde(rename = "aesKey")]
    aes_key: String,
}

/// Unwrap a login payload into flat `(name, value)` parameters.
pub fn open_payload(
    keys: &RsaKeyPair,
    payload: &HybridPayload,
) -> Result<Vec<(String, String)>, CryptoError> {
    let wrapped = BASE64.decode(payload.aes_key.trim())?;
    let aes_key = String::from_utf8(keys.decrypt(&wrapped)?)?;
    let json = aes::decrypt(&payload.data, &aes_key)?;

    match serde_json::from_str::<Value>(&json)? {
        Value::Object(fields) => Ok(fields
            .into_iter()
            .filter_map(|(name, value)| flatten(value).map(|v| (name, v)))
            .collect()),
        _ => Err(CryptoError::NotAnObject),
    }
}

fn flatten(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Encrypt `body` for the client owning `client_public_key` and wrap it as
/// `{"data":{"data":..,"aesKey":..}}`.
pub fn seal_response(body: &str, client_public_key: &str) -> Result<String, CryptoError> {
    let public = parse_public_key(client_public_key)?;
    let key = aes::generate_key();
    let envelope = Envelope {
        data: SealedBody {
            data: aes::encrypt(body, &key)?,
            aes_key: BASE64.encode(encrypt_for(&public, key.as_bytes())?),
        },
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Client side of [`seal_response`]: recover the plaintext body.
pub fn open_envelope(client_keys: &RsaKeyPair, envelope: &str) -> Result<String, CryptoError> {
    let envelope: Envelope = serde_json::from_str(envelope)?;
    let wrapped = BASE64.decode(envelope.data.aes_key.trim())?;
    let key = String::from_utf8(client_keys.decrypt(&wrapped)?)?;
    aes::decrypt(&envelope.data.data, &key)
}

/// Client side of [`open_payload`]: encrypt a JSON login form for the server.
pub fn seal_payload(
    json: &str,
    server_public: &RsaPublicKey,
    client_public_key: Option<String>,
) -> Result<HybridPayload, CryptoError> {
    let key = aes::generate_key();
    Ok(HybridPayload {
        data: aes::encrypt(json, &key)?,
        aes_key: BASE64.encode(encrypt_for(server_public, key.as_bytes())?),
        public_key: client_public_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_payload_reaches_original_fields() {
        let server = RsaKeyPair::generate(1024).unwrap();
        let payload = seal_payload(
            r#"{"username":"sa","password":"123456","captcha":"AB12","rememberMe":true,"extra":null}"#,
            server.public_key(),
            None,
        )
        .unwrap();

        let params: HashMap<_, _> = open_payload(&server, &payload).unwrap().into_iter().collect();
        assert_eq!(params.get("username").map(String::as_str), Some("sa"));
        assert_eq!(params.get("password").map(String::as_str), Some("123456"));
        assert_eq!(params.get("captcha").map(String::as_str), Some("AB12"));
        assert_eq!(params.get("rememberMe").map(String::as_str), Some("true"));
        assert!(!params.contains_key("extra"));
    }

    #[test]
    fn test_payload_must_be_object() {
        let server = RsaKeyPair::generate(1024).unwrap();
        let payload = seal_payload("[1,2]", server.public_key(), None).unwrap();
        assert!(matches!(open_payload(&server, &payload), Err(CryptoError::NotAnObject)));
    }

    #[test]
    fn test_payload_for_other_key_fails() {
        let server = RsaKeyPair::generate(1024).unwrap();
        let other = RsaKeyPair::generate(1024).unwrap();
        let payload = seal_payload("{}", other.public_key(), None).unwrap();
        assert!(open_payload(&server, &payload).is_err());
    }

    #[test]
    fn test_envelope_shape_and_contents() {
        let client = RsaKeyPair::generate(1024).unwrap();
        let body = r#"{"code":"400","msg":"nope"}"#;
        let sealed = seal_response(body, &client.public_key_base64().unwrap()).unwrap();

        let value: Value = serde_json::from_str(&sealed).unwrap();
        assert!(value["data"]["data"].is_string());
        assert!(value["data"]["aesKey"].is_string());
        assert!(sealed.starts_with(r#"{"data":{"data":"#));

        assert_eq!(open_envelope(&client, &sealed).unwrap(), body);
    }
}
