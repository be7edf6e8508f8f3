//! Header and cookie merging.
//!
//! Request headers are written first, then request cookies, then auth headers
//! (only where the request did not already set the name), then auth cookies.

use crate::models::{AuthResult, ParamMap};

/// Builds the outgoing header list from request params and an auth result.
pub fn build_headers(
    headers: &ParamMap,
    cookie_params: &ParamMap,
    auth: &AuthResult,
) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();

    // First writer wins for an identical name.
    for param in headers.values() {
        if !param.enabled || param.name.is_empty() {
            continue;
        }
        if !out.iter().any(|(name, _)| *name == param.name) {
            out.push((param.name.clone(), param.value.clone()));
        }
    }

    let request_cookies = dedupe_cookies(
        cookie_params
            .values()
            .filter(|p| p.enabled && !p.name.is_empty())
            .map(|p| (p.name.as_str(), p.value.as_str())),
    );
    append_cookies(&mut out, &request_cookies);

    if let Some(auth_headers) = &auth.headers {
        for (name, value) in auth_headers {
            if !out.iter().any(|(k, _)| k.eq_ignore_ascii_case(name)) {
                out.push((name.clone(), value.clone()));
            }
        }
    }

    if let Some(auth_cookies) = &auth.cookies {
        let auth_cookies = dedupe_cookies(
            auth_cookies
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        append_cookies(&mut out, &auth_cookies);
    }

    out
}

/// Deduplicates cookies by name: a name keeps the position of its first
/// occurrence and the value of its last.
fn dedupe_cookies<'a>(cookies: impl Iterator<Item = (&'a str, &'a str)>) -> Vec<(&'a str, &'a str)> {
    let mut out: Vec<(&str, &str)> = Vec::new();
    for (name, value) in cookies {
        match out.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => out.push((name, value)),
        }
    }
    out
}

/// Appends `name=value` pairs to the Cookie header, creating it if absent.
fn append_cookies(headers: &mut Vec<(String, String)>, cookies: &[(&str, &str)]) {
    if cookies.is_empty() {
        return;
    }
    let joined = cookies
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ");

    match headers
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case("cookie"))
    {
        Some((_, existing)) if existing.trim().is_empty() => *existing = joined,
        Some((_, existing)) => {
            let trimmed = existing.trim_end().trim_end_matches(';').to_string();
            *existing = format!("{}; {}", trimmed, joined);
        }
        None => headers.push(("Cookie".to_string(), joined)),
    }
}
