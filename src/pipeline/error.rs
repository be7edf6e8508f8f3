//! Pipeline error type.

use crate::assembler::AssembleError;
use crate::auth::AuthError;
use crate::cache::CacheError;
use crate::classifier::ClassifyError;
use crate::store::StoreError;
use crate::transport::{CancelError, TransportError};
use std::fmt;

/// Any failure of [`super::RequestPipeline`].
///
/// Each stage keeps its own error; transport errors in particular are
/// carried unmodified.
#[derive(Debug)]
pub enum PipelineError {
    /// The request could not be assembled. Never retried.
    Assemble(AssembleError),
    /// Credentials could not be produced.
    Auth(AuthError),
    /// The transport failed to deliver the request.
    Transport(TransportError),
    /// The response failed validation.
    Classify(ClassifyError),
    /// A cached credential could not be read or written.
    Cache(CacheError),
    /// Persisted state could not be read or written.
    Store(StoreError),
    /// Cancellation was refused.
    Cancel(CancelError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Assemble(err) => write!(f, "Invalid request: {}", err),
            PipelineError::Auth(err) => write!(f, "Authentication failed: {}", err),
            PipelineError::Transport(err) => write!(f, "{}", err),
            PipelineError::Classify(err) => write!(f, "Invalid response: {}", err),
            PipelineError::Cache(err) => write!(f, "Credentials cache error: {}", err),
            PipelineError::Store(err) => write!(f, "Storage error: {}", err),
            PipelineError::Cancel(err) => write!(f, "Cancel failed: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Assemble(err) => Some(err),
            PipelineError::Auth(err) => Some(err),
            PipelineError::Transport(err) => Some(err),
            PipelineError::Classify(err) => Some(err),
            PipelineError::Cache(err) => Some(err),
            PipelineError::Store(err) => Some(err),
            PipelineError::Cancel(err) => Some(err),
        }
    }
}

impl From<AssembleError> for PipelineError {
    fn from(err: AssembleError) -> Self {
        PipelineError::Assemble(err)
    }
}

impl From<AuthError> for PipelineError {
    fn from(err: AuthError) -> Self {
        PipelineError::Auth(err)
    }
}

impl From<TransportError> for PipelineError {
    fn from(err: TransportError) -> Self {
        PipelineError::Transport(err)
    }
}

impl From<ClassifyError> for PipelineError {
    fn from(err: ClassifyError) -> Self {
        PipelineError::Classify(err)
    }
}

impl From<CacheError> for PipelineError {
    fn from(err: CacheError) -> Self {
        PipelineError::Cache(err)
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        PipelineError::Store(err)
    }
}

impl From<CancelError> for PipelineError {
    fn from(err: CancelError) -> Self {
        PipelineError::Cancel(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ErrorKind;

    #[test]
    fn test_transport_error_is_passed_through() {
        let err: PipelineError = TransportError::new(ErrorKind::Timeout, "Request timed out").into();
        assert_eq!(err.to_string(), "[timeout] Request timed out");
        assert!(matches!(err, PipelineError::Transport(ref e) if e.kind == ErrorKind::Timeout));
    }

    #[test]
    fn test_display_prefixes() {
        let err: PipelineError = AssembleError::AuthBodyRequiresForm.into();
        assert!(err.to_string().starts_with("Invalid request: "));

        let err: PipelineError = CacheError::DecryptionFailed("bad tag".to_string()).into();
        assert!(err.to_string().starts_with("Credentials cache error: "));
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error as _;
        let err: PipelineError = ClassifyError::InvalidStatus(42).into();
        assert!(err.source().is_some());
    }
}
