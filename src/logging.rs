//! Log redaction for sensitive headers and query parameters.
//!
//! Header lists are logged at debug level by the pipeline and transport.
//! Values of credential-bearing headers and query parameters are masked
//! unless `redactSensitiveLogs` is turned off in the configuration.

/// Headers that contain sensitive information and are masked in log output.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "api-key",
    "auth-token",
    "x-auth-token",
    "access-token",
    "x-access-token",
    "bearer",
    "proxy-authorization",
];

/// Query parameters that commonly carry credentials.
pub const SENSITIVE_QUERY_PARAMS: &[&str] = &[
    "api_key",
    "apikey",
    "api-key",
    "access_token",
    "token",
    "auth",
    "client_secret",
    "password",
    "signature",
    "sig",
];

/// Placeholder logged in place of a sensitive value.
pub const REDACTED: &str = "<redacted>";

/// Checks if a header name is in [`SENSITIVE_HEADERS`] (case-insensitive).
pub fn is_sensitive_header(name: &str) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

/// Checks if a query parameter name is in [`SENSITIVE_QUERY_PARAMS`] (case-insensitive).
pub fn is_sensitive_query_param(name: &str) -> bool {
    SENSITIVE_QUERY_PARAMS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

/// Masks the values of selected query parameters in `url`.
///
/// Parameter names are percent-decoded before `is_sensitive` sees them.
/// Everything else in the URL, including parameter order and encoding of
/// untouched pairs, is kept as written.
pub fn redact_query(url: &str, is_sensitive: impl Fn(&str) -> bool) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let Some((path, query)) = base.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| {
            let raw_name = pair.split_once('=').map_or(pair, |(name, _)| name);
            let name = url::form_urlencoded::parse(raw_name.as_bytes())
                .next()
                .map(|(name, _)| name.into_owned())
                .unwrap_or_default();
            if !name.is_empty() && is_sensitive(&name) {
                format!("{}={}", raw_name, REDACTED)
            } else {
                pair.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("&");

    match fragment {
        Some(fragment) => format!("{}?{}#{}", path, query, fragment),
        None => format!("{}?{}", path, query),
    }
}

/// Renders headers as `Name: value` lines for a log message.
///
/// # Arguments
///
/// * `headers` - Header pairs in order
/// * `redact` - Mask values of sensitive headers
pub fn format_headers(headers: &[(String, String)], redact: bool) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if redact && is_sensitive_header(name) {
                format!("{}: {}", name, REDACTED)
            } else {
                format!("{}: {}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
