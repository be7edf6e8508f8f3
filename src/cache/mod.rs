//! Encrypted, time-bounded credentials cache
//!
//! Auth results are serialized to JSON, encrypted with a session key and kept
//! in memory under a key derived from the owning request or collection. Rows
//! never outlive the process because the key is never persisted.
//!
//! Expired rows are evicted lazily: a `get` that finds `expiresAt < now`
//! removes the row and reports it absent.

pub mod crypto;
pub mod error;

pub use crypto::SessionCipher;
pub use error::CacheError;

use crate::models::AuthResult;
use dashmap::DashMap;
use once_cell::sync::OnceCell;

const REQUEST_KEY_PREFIX: &str = "request-auth-";
const COLLECTION_KEY_PREFIX: &str = "collection-auth-";

/// Cache key for credentials owned by a request.
pub fn generate_cache_key(request_id: &str) -> String {
    format!("{}{}", REQUEST_KEY_PREFIX, request_id)
}

/// Cache key for credentials owned by a collection.
pub fn generate_collection_cache_key(collection_id: &str) -> String {
    format!("{}{}", COLLECTION_KEY_PREFIX, collection_id)
}

/// In-memory cache of encrypted auth results.
///
/// Safe to share between threads. The session key is generated on first use.
#[derive(Default)]
pub struct CredentialsCache {
    cipher: OnceCell<SessionCipher>,
    rows: DashMap<String, String>,
}

impl CredentialsCache {
    /// Creates an empty cache. No key is generated until the first `set` or `get`.
    pub fn new() -> Self {
        Self::default()
    }

    fn cipher(&self) -> &SessionCipher {
        self.cipher.get_or_init(|| {
            log::debug!(target: "rest_pipeline::cache", "Generating session key");
            SessionCipher::generate()
        })
    }

    /// Encrypts and stores `result` under `key`, replacing any previous row.
    pub fn set(&self, key: &str, result: &AuthResult) -> Result<(), CacheError> {
        let json =
            serde_json::to_vec(result).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let row = self.cipher().encrypt(&json)?;
        self.rows.insert(key.to_string(), row);
        log::debug!(
            target: "rest_pipeline::cache",
            "Stored credentials for {} (expires_at={:?})",
            key,
            result.expires_at
        );
        Ok(())
    }

    /// Returns the unexpired result stored under `key`.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - no row, or the row had expired and was evicted
    /// * `Ok(Some(result))` - the decrypted result
    /// * `Err(CacheError::DecryptionFailed)` - the row could not be decrypted;
    ///   it is kept
    pub fn get(&self, key: &str) -> Result<Option<AuthResult>, CacheError> {
        self.get_at(key, chrono::Utc::now().timestamp())
    }

    /// [`CredentialsCache::get`] with an explicit clock, in Unix seconds.
    pub fn get_at(&self, key: &str, now: i64) -> Result<Option<AuthResult>, CacheError> {
        // Clone the row so no shard lock is held while decrypting.
        let row = match self.rows.get(key) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };

        let plaintext = self.cipher().decrypt(&row)?;
        let result: AuthResult = serde_json::from_slice(&plaintext)
            .map_err(|e| CacheError::DecryptionFailed(format!("Invalid cached payload: {}", e)))?;

        if result.is_expired_at(now) {
            // A concurrent `set` may have replaced the row; only evict what we read.
            self.rows.remove_if(key, |_, current| *current == row);
            log::debug!(target: "rest_pipeline::cache", "Evicted expired credentials for {}", key);
            return Ok(None);
        }

        Ok(Some(result))
    }

    /// Removes the row under `key`, if any.
    pub fn remove(&self, key: &str) {
        self.rows.remove(key);
    }

    /// Removes every row.
    pub fn clear(&self) {
        self.rows.clear();
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
