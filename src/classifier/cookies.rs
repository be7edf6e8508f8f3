//! Cookie and HTTP date parsing.

use crate::models::ResponseCookie;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// `strftime` layouts seen in `Expires` attributes and `Date` headers, all in GMT.
const GMT_FORMATS: &[&str] = &[
    // RFC 1123
    "%a, %d %b %Y %H:%M:%S GMT",
    // RFC 850, tried before Netscape so a two-digit year is not read as year 15
    "%A, %d-%b-%y %H:%M:%S GMT",
    // Netscape
    "%a, %d-%b-%Y %H:%M:%S GMT",
    // asctime
    "%a %b %e %H:%M:%S %Y",
];

/// Parses the date formats HTTP servers use, returning UTC.
///
/// Accepts RFC 3339, RFC 2822 and the GMT layouts in [`GMT_FORMATS`].
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    GMT_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(value, fmt)
            .ok()
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
    })
}

/// Renders a timestamp as canonical RFC 3339 UTC with millisecond precision.
pub fn canonical_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses one `Set-Cookie` header value.
///
/// Returns `None` when the cookie has no name. Unknown attributes are ignored;
/// an `Expires` value that does not parse is dropped.
pub fn parse_set_cookie(header_value: &str) -> Option<ResponseCookie> {
    let mut segments = header_value.split(';');
    let first = segments.next()?.trim();
    let (name, value) = first
        .split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .unwrap_or((first, ""));
    if name.is_empty() {
        return None;
    }

    let mut cookie = ResponseCookie::new(name, value);
    for segment in segments.map(str::trim).filter(|s| !s.is_empty()) {
        let (key, val) = match segment.split_once('=') {
            Some((key, val)) => (key.trim(), val.trim()),
            None => (segment, ""),
        };

        match key.to_ascii_lowercase().as_str() {
            "secure" => cookie.secure = Some(true),
            "httponly" => cookie.http_only = Some(true),
            _ if val.is_empty() => {}
            "domain" => cookie.domain = Some(val.to_string()),
            "path" => cookie.path = Some(val.to_string()),
            "expires" => cookie.expires = parse_http_date(val).map(|dt| canonical_timestamp(&dt)),
            "max-age" => cookie.max_age = val.parse().ok(),
            "samesite" => cookie.same_site = Some(normalize_same_site(val)),
            _ => {}
        }
    }
    Some(cookie)
}

fn normalize_same_site(value: &str) -> String {
    match value.to_ascii_lowercase().as_str() {
        "lax" => "Lax".to_string(),
        "strict" => "Strict".to_string(),
        "none" => "None".to_string(),
        other => other.to_string(),
    }
}
