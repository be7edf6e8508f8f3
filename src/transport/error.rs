//! Transport error types.
//!
//! Transport failures are passed through the pipeline unmodified, so they
//! carry everything a caller needs to render them: a kind, a message, the time
//! of failure and an optional trace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// The request did not complete within its timeout.
    Timeout,
    /// The peer refused the connection.
    ConnectionRefused,
    /// Any other connect-phase or mid-stream network failure.
    Connection,
    /// TLS handshake or certificate failure.
    Tls,
    /// HTTP protocol failure (malformed response, redirect loop, ...).
    Http,
    /// The request could not be built from its description.
    InvalidRequest,
    /// Local file I/O failed (request body file, multipart file, spill file).
    Io,
    /// Cancelled through [`super::Transport::cancel`].
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Timeout => "timeout",
            ErrorKind::ConnectionRefused => "connectionRefused",
            ErrorKind::Connection => "connection",
            ErrorKind::Tls => "tls",
            ErrorKind::Http => "http",
            ErrorKind::InvalidRequest => "invalidRequest",
            ErrorKind::Io => "io",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// A failed send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportError {
    pub kind: ErrorKind,
    pub message: String,
    /// RFC 3339 time of failure.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

impl TransportError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            trace: None,
        }
    }

    /// Attaches debugging detail, typically the source error's `Debug` output.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn cancelled(request_id: &str) -> Self {
        Self::new(
            ErrorKind::Cancelled,
            format!("Request {} was cancelled", request_id),
        )
    }

    pub fn io(context: &str, err: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, format!("{}: {}", context, err)).with_trace(format!("{:?}", err))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for TransportError {}

/// Map reqwest failures onto transport error kinds.
#[cfg(feature = "native")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        use std::error::Error as _;

        let message = err.to_string();
        let mut detail = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            detail.push_str(&cause.to_string());
            detail.push(' ');
            source = cause.source();
        }
        let lowered = format!("{} {}", message, detail).to_lowercase();

        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_builder() {
            ErrorKind::InvalidRequest
        } else if lowered.contains("certificate")
            || lowered.contains("tls")
            || lowered.contains("ssl")
        {
            ErrorKind::Tls
        } else if err.is_connect() && lowered.contains("refused") {
            ErrorKind::ConnectionRefused
        } else if err.is_connect() || err.is_request() || err.is_body() {
            ErrorKind::Connection
        } else {
            ErrorKind::Http
        };

        let message = if detail.is_empty() {
            message
        } else {
            format!("{} ({})", message, detail.trim_end())
        };
        TransportError::new(kind, message).with_trace(format!("{:?}", err))
    }
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::new(ErrorKind::InvalidRequest, format!("Invalid URL: {}", err))
    }
}

/// Errors for cancellation requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelError {
    /// No in-flight request has this id.
    NotFound(String),

    /// The transport has no way to abort a request.
    Unsupported,
}

impl fmt::Display for CancelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelError::NotFound(id) => write!(f, "Request not found: {}", id),
            CancelError::Unsupported => write!(f, "Transport does not support cancellation"),
        }
    }
}

impl std::error::Error for CancelError {}
