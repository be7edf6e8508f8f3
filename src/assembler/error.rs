//! Request assembly error types.
//!
//! All of these are validation failures caused by the request as authored.
//! They are surfaced to the user directly and never retried.

use crate::models::FormEncoding;
use std::fmt;

/// Errors that can occur while assembling a wire-ready request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    /// The resolved URL could not be parsed.
    InvalidUrl(String),

    /// A file field is enabled on a form encoding that cannot carry files.
    FileFieldNotAllowed {
        encoding: FormEncoding,
        field: String,
    },

    /// The auth result carries body fields but the body is not a form.
    AuthBodyRequiresForm,

    /// The auth result carries body fields but the form encoding cannot take them.
    AuthBodyUnsupportedEncoding(FormEncoding),
}

fn encoding_name(encoding: FormEncoding) -> &'static str {
    match encoding {
        FormEncoding::Url => "url",
        FormEncoding::Multipart => "multipart",
        FormEncoding::Plain => "plain",
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            AssembleError::FileFieldNotAllowed { encoding, field } => write!(
                f,
                "File field '{}' is not allowed with '{}' form encoding; use multipart",
                field,
                encoding_name(*encoding)
            ),
            AssembleError::AuthBodyRequiresForm => {
                write!(f, "Auth placement 'body' is only supported with form bodies")
            }
            AssembleError::AuthBodyUnsupportedEncoding(encoding) => write!(
                f,
                "Auth placement 'body' is not supported with '{}' form encoding",
                encoding_name(*encoding)
            ),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<url::ParseError> for AssembleError {
    fn from(err: url::ParseError) -> Self {
        AssembleError::InvalidUrl(err.to_string())
    }
}
