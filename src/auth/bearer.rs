//! Bearer token authentication (RFC 6750).

/// Default authorization scheme for bearer tokens.
pub const DEFAULT_SCHEME: &str = "Bearer";

/// Formats a token into an authorization header value.
///
/// A missing or blank scheme falls back to `Bearer`.
///
/// # Examples
///
/// ```
/// use rest_pipeline::auth::bearer::bearer_token;
///
/// assert_eq!(bearer_token(None, "abc123xyz"), "Bearer abc123xyz");
/// assert_eq!(bearer_token(Some("Token"), "abc"), "Token abc");
/// ```
pub fn bearer_token(scheme: Option<&str>, token: &str) -> String {
    let scheme = scheme
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SCHEME);
    format!("{} {}", scheme, token)
}
