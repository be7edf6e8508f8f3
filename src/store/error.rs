//! Blob store error types.

use std::fmt;

/// Errors reported by a [`super::BlobStore`] backend.
#[derive(Debug)]
pub enum BlobError {
    /// No blob exists under the name.
    NotFound(String),

    /// The name is not an acceptable logical path.
    InvalidName(String),

    /// Underlying I/O failure.
    Io(std::io::Error),

    /// The blob exists but is not valid JSON.
    Parse(String),

    /// A secure value could not be encrypted for saving.
    Encryption(String),
}

impl fmt::Display for BlobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobError::NotFound(name) => write!(f, "Document not found: {}", name),
            BlobError::InvalidName(name) => write!(f, "Invalid document name: {}", name),
            BlobError::Io(err) => write!(f, "Storage I/O error: {}", err),
            BlobError::Parse(msg) => write!(f, "Stored document is not JSON: {}", msg),
            BlobError::Encryption(msg) => write!(f, "Failed to encrypt secure value: {}", msg),
        }
    }
}

impl std::error::Error for BlobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BlobError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BlobError {
    fn from(err: std::io::Error) -> Self {
        BlobError::Io(err)
    }
}

/// Hard failures of [`super::VersionedStore`].
///
/// Soft failures (missing or unreadable documents) are reported through
/// [`super::LoadOutcome`] instead.
#[derive(Debug)]
pub enum StoreError {
    /// The migration function rejected the stored content.
    MigrationFailed {
        name: String,
        from_version: u32,
        message: String,
    },

    /// The backend failed for a reason other than a missing document.
    Backend(BlobError),

    /// The content could not be serialized for saving.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::MigrationFailed {
                name,
                from_version,
                message,
            } => write!(
                f,
                "Migration of {} from version {} failed: {}",
                name, from_version, message
            ),
            StoreError::Backend(err) => write!(f, "{}", err),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BlobError> for StoreError {
    fn from(err: BlobError) -> Self {
        StoreError::Backend(err)
    }
}
