//! HTTP response data models.
//!
//! [`RawResponse`] is what a transport hands back; [`ClassifiedResponse`] is
//! the sanitized, validated shape produced by [`crate::classifier`].

use serde::{Deserialize, Serialize};

/// An HTTP cookie parsed from a `Set-Cookie` response header.
///
/// Optional attributes are `None` when the server did not send them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseCookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Expiration timestamp. `None` indicates a session cookie or unknown expiration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    /// Max-Age attribute as seconds until expiry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    /// `Strict`, `Lax` or `None`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl ResponseCookie {
    /// Creates a cookie with only a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            max_age: None,
            secure: None,
            http_only: None,
            same_site: None,
        }
    }
}

/// Response as returned by a transport, before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    /// Correlation id of the request that produced this response.
    pub request_id: String,

    /// HTTP status code (e.g., 200, 404, 500).
    pub status: u16,

    /// HTTP status text (e.g., "OK", "Not Found").
    pub status_text: String,

    /// Response headers in wire order. Repeated headers appear repeatedly.
    pub headers: Vec<(String, String)>,

    #[serde(default)]
    pub cookies: Vec<ResponseCookie>,

    /// Response body bytes. Empty when the body was written to `file_path`.
    #[serde(default)]
    pub body: Vec<u8>,

    /// Response size in bytes.
    pub size: u64,

    /// Total request duration in milliseconds.
    pub duration: u64,

    /// Time the response was received.
    pub timestamp: String,

    /// Set when the body exceeded the preview threshold and was streamed to disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl RawResponse {
    /// Creates a response with the given status and an empty body, timestamped now.
    pub fn new(request_id: impl Into<String>, status: u16, status_text: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status,
            status_text: status_text.into(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: Vec::new(),
            size: 0,
            duration: 0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            file_path: None,
        }
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Gets the first header value matching `name` case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Adds a header and sets the body, updating `size` to the body length.
    pub fn with_body(mut self, content_type: &str, body: Vec<u8>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.size = body.len() as u64;
        self.body = body;
        self
    }
}

/// Sanitized response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedResponse {
    pub request_id: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub cookies: Vec<ResponseCookie>,
    pub size: u64,
    pub duration: u64,
    /// Canonical RFC 3339 UTC timestamp with millisecond precision.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// True when the Content-Type names a binary media type.
    pub is_binary: bool,
    /// Decoded body for text responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Base64 of the body for binary responses within the preview threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_base64: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl ClassifiedResponse {
    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
