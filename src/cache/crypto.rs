//! AES-256-GCM session cipher for cache rows.
//!
//! Rows are stored as `base64(nonce || ciphertext)` with a fresh random
//! 96-bit nonce per encryption. The cache key lives only in memory; the
//! encrypted blob store uses the same format with a host-supplied key.

use super::error::CacheError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits / 32 bytes).
pub const KEY_SIZE: usize = 32;

/// Symmetric cipher keyed for the lifetime of one cache instance.
pub struct SessionCipher {
    cipher: Aes256Gcm,
}

impl SessionCipher {
    /// Creates a cipher with a freshly generated random key.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill(&mut key);
        Self::from_key(&key)
    }

    /// Creates a cipher from raw key bytes.
    pub fn from_key(key: &[u8; KEY_SIZE]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypts `plaintext`, returning `base64(nonce || ciphertext)`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<String, CacheError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CacheError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Decrypts a row produced by [`SessionCipher::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<Vec<u8>, CacheError> {
        let combined = BASE64
            .decode(encoded)
            .map_err(|e| CacheError::DecryptionFailed(format!("Invalid base64: {}", e)))?;
        if combined.len() < NONCE_SIZE {
            return Err(CacheError::DecryptionFailed(
                "Ciphertext too short (missing nonce)".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| CacheError::DecryptionFailed(e.to_string()))
    }
}
