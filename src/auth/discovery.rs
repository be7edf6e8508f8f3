//! OpenID Connect discovery.

use super::AuthError;
use crate::models::OidcDiscovery;
use serde::Deserialize;

pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Returns the discovery document URL for an issuer.
///
/// URLs that already point at the well-known document are returned as is.
pub fn discovery_url(issuer: &str) -> String {
    let issuer = issuer.trim();
    if issuer.contains(WELL_KNOWN_PATH) {
        issuer.to_string()
    } else {
        format!("{}{}", issuer.trim_end_matches('/'), WELL_KNOWN_PATH)
    }
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    authorization_endpoint: Option<String>,
    token_endpoint: Option<String>,
    device_authorization_endpoint: Option<String>,
}

/// Extracts the endpoints from a discovery document.
pub fn parse_discovery(body: &[u8]) -> Result<OidcDiscovery, AuthError> {
    let document: DiscoveryDocument = serde_json::from_slice(body).map_err(|e| {
        AuthError::Discovery(format!("Failed to parse OIDC discovery response: {}", e))
    })?;
    Ok(OidcDiscovery {
        authorization_endpoint: document.authorization_endpoint,
        token_endpoint: document.token_endpoint,
        device_authorization_endpoint: document.device_authorization_endpoint,
    })
}
