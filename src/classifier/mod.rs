//! Response classification
//!
//! Turns a transport's [`RawResponse`] into a [`ClassifiedResponse`]:
//!
//! - binary bodies (images, audio, video, PDF, octet-stream) get a base64
//!   preview when they fit the preview threshold, and no preview otherwise;
//! - everything else is decoded as UTF-8 text;
//! - the response timestamp and cookie expiries are rewritten as canonical
//!   RFC 3339 UTC, dropping cookie expiries that do not parse;
//! - the result is validated before it is returned.

pub mod cookies;
pub mod error;

pub use cookies::{canonical_timestamp, parse_http_date, parse_set_cookie};
pub use error::ClassifyError;

use crate::content_type::is_binary_content_type;
use crate::models::{ClassifiedResponse, RawResponse, ResponseCookie};
use base64::{engine::general_purpose, Engine as _};

/// Default preview threshold: 20 MiB.
pub const DEFAULT_PREVIEW_MAX_BYTES: u64 = 20 * 1024 * 1024;

/// Input chunk size for base64 encoding. A multiple of 3, so encoding chunk by
/// chunk yields exactly the one-shot encoding with padding only at the end.
const BASE64_CHUNK_BYTES: usize = 3 * 32 * 1024;

/// Classifies and sanitizes a raw response.
///
/// # Arguments
///
/// * `raw` - Response returned by the transport
/// * `preview_max_bytes` - Largest binary body that still gets a base64 preview
///
/// # Returns
///
/// The classified response, or a `ClassifyError` when the result fails validation.
pub fn classify(raw: RawResponse, preview_max_bytes: u64) -> Result<ClassifiedResponse, ClassifyError> {
    let timestamp = parse_http_date(&raw.timestamp)
        .map(|dt| canonical_timestamp(&dt))
        .ok_or_else(|| ClassifyError::InvalidTimestamp(raw.timestamp.clone()))?;

    let content_type = raw.content_type().map(str::to_string);
    let is_binary = content_type.as_deref().map_or(false, is_binary_content_type);

    let (text, preview_base64) = if is_binary {
        let preview = (raw.body.len() as u64 <= preview_max_bytes && !raw.body.is_empty())
            .then(|| encode_base64_chunked(&raw.body));
        (None, preview)
    } else {
        (Some(String::from_utf8_lossy(&raw.body).into_owned()), None)
    };

    let cookies = raw.cookies.into_iter().map(sanitize_cookie).collect();

    let classified = ClassifiedResponse {
        request_id: raw.request_id,
        status: raw.status,
        status_text: raw.status_text,
        headers: raw.headers,
        cookies,
        size: raw.size,
        duration: raw.duration,
        timestamp,
        content_type,
        is_binary,
        text,
        preview_base64,
        file_path: raw.file_path,
    };

    validate(&classified)?;
    Ok(classified)
}

/// Rewrites `expires` canonically, or drops it when it does not parse.
fn sanitize_cookie(mut cookie: ResponseCookie) -> ResponseCookie {
    cookie.expires = cookie
        .expires
        .as_deref()
        .and_then(parse_http_date)
        .map(|dt| canonical_timestamp(&dt));
    cookie
}

/// Base64-encodes `bytes` in fixed-size chunks.
pub fn encode_base64_chunked(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(BASE64_CHUNK_BYTES) {
        general_purpose::STANDARD.encode_string(chunk, &mut out);
    }
    out
}

/// Checks the output shape of a classified response.
pub fn validate(response: &ClassifiedResponse) -> Result<(), ClassifyError> {
    if !(100..=599).contains(&response.status) {
        return Err(ClassifyError::InvalidStatus(response.status));
    }
    if response.headers.iter().any(|(name, _)| name.trim().is_empty()) {
        return Err(ClassifyError::EmptyHeaderName);
    }
    if response.cookies.iter().any(|c| c.name.trim().is_empty()) {
        return Err(ClassifyError::EmptyCookieName);
    }
    if chrono::DateTime::parse_from_rfc3339(&response.timestamp).is_err() {
        return Err(ClassifyError::InvalidTimestamp(response.timestamp.clone()));
    }
    Ok(())
}
