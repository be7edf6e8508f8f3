//! Content type helpers.
//!
//! Maps declared text-body languages to MIME types for outgoing requests and
//! decides whether a response Content-Type denotes binary data.

use crate::models::TextLanguage;

/// Returns the MIME type sent for a text body of the given language.
///
/// # Examples
///
/// ```
/// use rest_pipeline::content_type::mime_for_language;
/// use rest_pipeline::models::TextLanguage;
///
/// assert_eq!(mime_for_language(TextLanguage::Json), "application/json");
/// ```
pub fn mime_for_language(language: TextLanguage) -> &'static str {
    match language {
        TextLanguage::Json => "application/json",
        TextLanguage::Xml => "application/xml",
        TextLanguage::Html => "text/html",
        TextLanguage::Javascript => "application/javascript",
        TextLanguage::Yaml => "application/x-yaml",
        TextLanguage::Graphql => "application/graphql",
        TextLanguage::Css => "text/css",
        TextLanguage::Csv => "text/csv",
        TextLanguage::Plaintext => "text/plain",
    }
}

/// Extracts the lowercased media type from a Content-Type value,
/// ignoring charset and other parameters.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// Checks whether a Content-Type names binary data.
///
/// Binary means `image/*`, `audio/*`, `video/*`, `application/pdf` or
/// `application/octet-stream`. Matching is case-insensitive and parameters
/// are ignored.
pub fn is_binary_content_type(content_type: &str) -> bool {
    let mime = media_type(content_type);
    mime.starts_with("image/")
        || mime.starts_with("audio/")
        || mime.starts_with("video/")
        || mime == "application/pdf"
        || mime == "application/octet-stream"
}

/// Finds a header value in a case-insensitive manner.
///
/// # Arguments
///
/// * `headers` - Header pairs in order
/// * `name` - Header name to look for
///
/// # Returns
///
/// `Some(&str)` with the first matching value, or `None` if not found.
pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Returns true when `headers` contain a Content-Type.
pub fn has_content_type(headers: &[(String, String)]) -> bool {
    find_header(headers, "content-type").is_some()
}
