//! Authentication configuration and the auth result merged into requests.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Where a credential is placed on the outgoing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthPlacement {
    Header {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Query {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Cookie {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Body {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field_name: Option<String>,
    },
}

/// Whether an OAuth2 token may be kept in the credentials cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TokenCachingPolicy {
    Always,
    Never,
}

/// How OAuth2 client credentials are sent to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ClientAuth {
    /// `Authorization: Basic base64(client_id:client_secret)`
    Basic,
    /// `client_id` and `client_secret` in the form body
    #[default]
    Body,
}

/// Authentication scheme configured on a request or collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AuthConfig {
    #[default]
    None,
    /// Use the enclosing collection's authentication.
    Inherit,
    Basic {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
    Bearer {
        #[serde(default)]
        token: Option<String>,
        /// Authorization scheme for header placement. Empty means `Bearer`.
        #[serde(default)]
        scheme: Option<String>,
        #[serde(default)]
        placement: Option<AuthPlacement>,
    },
    ApiKey {
        #[serde(default)]
        key: Option<String>,
        #[serde(default)]
        value: Option<String>,
        #[serde(default)]
        placement: Option<AuthPlacement>,
    },
    #[serde(rename_all = "camelCase")]
    Oauth2 {
        grant_type: String,
        #[serde(default)]
        auth_url: Option<String>,
        #[serde(default)]
        token_url: Option<String>,
        #[serde(default)]
        client_id: Option<String>,
        #[serde(default)]
        client_secret: Option<String>,
        #[serde(default)]
        scope: Option<String>,
        #[serde(default)]
        refresh_token: Option<String>,
        #[serde(default)]
        token_caching: Option<TokenCachingPolicy>,
        #[serde(default)]
        client_auth: Option<ClientAuth>,
        #[serde(default)]
        token_extra_params: Option<BTreeMap<String, String>>,
    },
}

impl AuthConfig {
    /// Short scheme name for log lines.
    pub fn scheme_name(&self) -> &'static str {
        match self {
            AuthConfig::None => "none",
            AuthConfig::Inherit => "inherit",
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::Bearer { .. } => "bearer",
            AuthConfig::ApiKey { .. } => "apiKey",
            AuthConfig::Oauth2 { .. } => "oauth2",
        }
    }

    /// Whether a result produced by this config may be stored in the credentials cache.
    ///
    /// Only OAuth2 tokens are cached, and only when the caching policy allows it.
    pub fn is_cacheable(&self) -> bool {
        match self {
            AuthConfig::Oauth2 { token_caching, .. } => {
                *token_caching != Some(TokenCachingPolicy::Never)
            }
            _ => false,
        }
    }
}

/// Credential contributions produced by an authentication flow.
///
/// Maps are sorted so serialization (and therefore the encrypted cache row)
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<BTreeMap<String, Value>>,
    /// Unix seconds. `None` never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl AuthResult {
    /// Result carrying a single header.
    pub fn with_header(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(name.into(), value.into());
        Self {
            headers: Some(headers),
            ..Default::default()
        }
    }

    /// True when `expires_at` lies strictly before `now` (Unix seconds).
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(at) if at < now)
    }

    /// True when any body field is present.
    pub fn has_body_fields(&self) -> bool {
        self.body.as_ref().map_or(false, |b| !b.is_empty())
    }
}

/// Endpoints advertised by an OpenID Connect discovery document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OidcDiscovery {
    pub authorization_endpoint: Option<String>,
    pub token_endpoint: Option<String>,
    pub device_authorization_endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_config_with_query_placement() {
        let json = r#"{"type":"bearer","token":"t","placement":{"type":"query","name":"access_token"}}"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config,
            AuthConfig::Bearer {
                token: Some("t".to_string()),
                scheme: None,
                placement: Some(AuthPlacement::Query {
                    name: Some("access_token".to_string())
                }),
            }
        );
    }

    #[test]
    fn test_oauth2_config_camel_case() {
        let json = r#"{
            "type": "oauth2",
            "grantType": "client_credentials",
            "tokenUrl": "https://auth.example.com/token",
            "clientId": "id",
            "clientSecret": "secret",
            "tokenCaching": "never",
            "clientAuth": "basic"
        }"#;
        let config: AuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.scheme_name(), "oauth2");
        assert!(!config.is_cacheable());
    }

    #[test]
    fn test_cache_policy() {
        let oauth = AuthConfig::Oauth2 {
            grant_type: "client_credentials".to_string(),
            auth_url: None,
            token_url: None,
            client_id: None,
            client_secret: None,
            scope: None,
            refresh_token: None,
            token_caching: None,
            client_auth: None,
            token_extra_params: None,
        };
        assert!(oauth.is_cacheable());
        assert!(!AuthConfig::Basic {
            username: None,
            password: None
        }
        .is_cacheable());
    }

    #[test]
    fn test_auth_result_serializes_sorted_and_sparse() {
        let mut result = AuthResult::with_header("X-B", "2");
        result.headers.as_mut().unwrap().insert("X-A".to_string(), "1".to_string());
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"headers":{"X-A":"1","X-B":"2"}}"#);
    }

    #[test]
    fn test_expiry() {
        let result = AuthResult {
            expires_at: Some(100),
            ..Default::default()
        };
        assert!(result.is_expired_at(101));
        assert!(!result.is_expired_at(100));
        assert!(!AuthResult::default().is_expired_at(i64::MAX));
    }
}
