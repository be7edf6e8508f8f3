//! Response classification error types.

use std::fmt;

/// A classified response failed validation.
///
/// These are hard failures: a response that does not satisfy the output
/// shape is never handed back in degraded form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// Status code outside 100..=599.
    InvalidStatus(u16),

    /// A response header has an empty name.
    EmptyHeaderName,

    /// A cookie has an empty name.
    EmptyCookieName,

    /// The response timestamp could not be parsed.
    InvalidTimestamp(String),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::InvalidStatus(status) => {
                write!(f, "Invalid response: status {} is out of range", status)
            }
            ClassifyError::EmptyHeaderName => write!(f, "Invalid response: empty header name"),
            ClassifyError::EmptyCookieName => write!(f, "Invalid response: empty cookie name"),
            ClassifyError::InvalidTimestamp(value) => {
                write!(f, "Invalid response: unparseable timestamp '{}'", value)
            }
        }
    }
}

impl std::error::Error for ClassifyError {}
