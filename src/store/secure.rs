//! At-rest encryption of secure values.
//!
//! [`SecureBlobStore`] wraps another [`BlobStore`] and encrypts the `value`
//! of every JSON object marked `"secure": true` before it is written, and
//! decrypts it after it is read. Parameters and environment variables
//! serialize to exactly that shape, so secret headers, query values and
//! variables never reach the backend in plaintext.
//!
//! Values are stored as `base64(nonce || ciphertext)` with AES-256-GCM, using
//! a 32-byte key supplied by the host (typically kept in the OS keychain).
//!
//! A value that fails to decrypt is logged with its JSON path and left as
//! stored, so one damaged field does not make the whole document unreadable.

use super::{BlobError, BlobStore};
use crate::cache::crypto::{SessionCipher, KEY_SIZE};
use crate::cache::CacheError;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const LOG_TARGET: &str = "rest_pipeline::store";

/// A [`BlobStore`] decorator that encrypts secure values at rest.
pub struct SecureBlobStore {
    inner: Arc<dyn BlobStore>,
    cipher: SessionCipher,
}

impl SecureBlobStore {
    /// Wraps `inner`, encrypting with `key`.
    ///
    /// # Arguments
    ///
    /// * `inner` - Backend that receives the encrypted documents
    /// * `key` - AES-256 key; the same key must be used to read documents back
    pub fn new(inner: Arc<dyn BlobStore>, key: &[u8; KEY_SIZE]) -> Self {
        Self {
            inner,
            cipher: SessionCipher::from_key(key),
        }
    }
}

#[async_trait]
impl BlobStore for SecureBlobStore {
    async fn load(&self, name: &str) -> Result<Value, BlobError> {
        let mut value = self.inner.load(name).await?;
        decrypt_secure_values(&mut value, &self.cipher, name);
        Ok(value)
    }

    async fn save(&self, name: &str, value: &Value) -> Result<(), BlobError> {
        let mut encrypted = value.clone();
        encrypt_secure_values(&mut encrypted, &self.cipher)?;
        self.inner.save(name, &encrypted).await
    }

    async fn delete(&self, name: &str) -> Result<(), BlobError> {
        self.inner.delete(name).await
    }
}

fn is_secure(map: &serde_json::Map<String, Value>) -> bool {
    map.get("secure").and_then(Value::as_bool) == Some(true)
}

/// Encrypts every secure value in `value`. Any failure aborts the save.
fn encrypt_secure_values(value: &mut Value, cipher: &SessionCipher) -> Result<(), BlobError> {
    match value {
        Value::Object(map) if is_secure(map) => {
            if let Some(Value::String(plain)) = map.get_mut("value") {
                *plain = cipher
                    .encrypt(plain.as_bytes())
                    .map_err(|e| BlobError::Encryption(e.to_string()))?;
            }
            Ok(())
        }
        Value::Object(map) => map
            .values_mut()
            .try_for_each(|v| encrypt_secure_values(v, cipher)),
        Value::Array(items) => items
            .iter_mut()
            .try_for_each(|v| encrypt_secure_values(v, cipher)),
        _ => Ok(()),
    }
}

fn decrypt_secure_values(value: &mut Value, cipher: &SessionCipher, name: &str) {
    decrypt_at(value, cipher, name, &mut Vec::new());
}

fn decrypt_at(value: &mut Value, cipher: &SessionCipher, name: &str, path: &mut Vec<String>) {
    match value {
        Value::Object(map) if is_secure(map) => {
            if let Some(Value::String(stored)) = map.get_mut("value") {
                let decrypted = cipher.decrypt(stored).and_then(|bytes| {
                    String::from_utf8(bytes).map_err(|e| CacheError::DecryptionFailed(e.to_string()))
                });
                match decrypted {
                    Ok(plain) => *stored = plain,
                    Err(e) => {
                        path.push("value".to_string());
                        log::error!(
                            target: LOG_TARGET,
                            "Decryption failed in {} at {}: {}",
                            name,
                            format_json_path(path),
                            e
                        );
                        path.pop();
                    }
                }
            }
        }
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                path.push(key.clone());
                decrypt_at(child, cipher, name, path);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter_mut().enumerate() {
                path.push(format!("[{}]", index));
                decrypt_at(child, cipher, name, path);
                path.pop();
            }
        }
        _ => {}
    }
}

/// Renders `["content", "headers", "[0]", "value"]` as `content.headers[0].value`.
fn format_json_path(path: &[String]) -> String {
    let mut out = String::new();
    for segment in path {
        if !segment.starts_with('[') && !out.is_empty() {
            out.push('.');
        }
        out.push_str(segment);
    }
    out
}
