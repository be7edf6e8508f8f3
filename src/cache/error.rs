//! Credentials cache error types.

use std::fmt;

/// Errors raised by the credentials cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Encrypting a row failed.
    EncryptionFailed(String),

    /// A stored row could not be decrypted or decoded.
    ///
    /// The row is left in place; the caller decides whether to remove it.
    DecryptionFailed(String),

    /// The auth result could not be serialized.
    Serialization(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::EncryptionFailed(msg) => write!(f, "Encryption failed: {}", msg),
            CacheError::DecryptionFailed(msg) => write!(f, "Decryption failed: {}", msg),
            CacheError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}
