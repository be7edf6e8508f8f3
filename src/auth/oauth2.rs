//! OAuth 2.0 token acquisition.
//!
//! Supports the `client_credentials` and `refresh_token` grants (RFC 6749
//! sections 4.4 and 6). Token requests are always form-encoded POSTs; the
//! client authenticates either with HTTP Basic or with credentials in the
//! form body.

use super::basic::basic_auth;
use super::AuthError;
use crate::models::{AuthConfig, AuthResult, ClientAuth};
use serde_json::Value;
use std::collections::HashMap;

/// Seconds subtracted from `expires_in` so cached tokens are refreshed early.
pub const EXPIRY_SKEW_SECS: i64 = 300;

pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";
pub const GRANT_PASSWORD: &str = "password";
pub const GRANT_DEVICE_CODE: &str = "device_code";

/// A token endpoint call, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    pub token_url: String,
    pub headers: Vec<(String, String)>,
    /// `application/x-www-form-urlencoded` body.
    pub body: String,
}

impl TokenRequest {
    /// Builds the token request for an oauth2 configuration.
    ///
    /// # Returns
    ///
    /// The request, or an error when the grant is unsupported or a required
    /// field is missing.
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let AuthConfig::Oauth2 {
            grant_type,
            token_url,
            client_id,
            client_secret,
            scope,
            refresh_token,
            client_auth,
            token_extra_params,
            ..
        } = config
        else {
            return Err(AuthError::UnsupportedScheme(config.scheme_name().to_string()));
        };

        let mut params: Vec<(&str, &str)> = vec![("grant_type", grant_type.as_str())];
        match grant_type.as_str() {
            GRANT_CLIENT_CREDENTIALS => {}
            GRANT_REFRESH_TOKEN => {
                let token = required(refresh_token, "Refresh token")?;
                params.push(("refresh_token", token));
            }
            GRANT_PASSWORD => {
                return Err(AuthError::UnsupportedGrant(
                    "unsupported_grant_type: resource owner password credentials are not supported"
                        .to_string(),
                ))
            }
            GRANT_DEVICE_CODE => {
                return Err(AuthError::NotImplemented(
                    "device_code grant is not implemented".to_string(),
                ))
            }
            other => return Err(AuthError::UnsupportedGrant(other.to_string())),
        }

        let token_url = required(token_url, "Token URL")?;
        let client_id = required(client_id, "Client ID")?;
        let client_secret = required(client_secret, "Client Secret")?;

        if let Some(scope) = scope.as_deref() {
            params.push(("scope", scope));
        }

        let mut headers = Vec::new();
        match client_auth.unwrap_or_default() {
            ClientAuth::Basic => {
                if client_id.is_empty() || client_secret.is_empty() {
                    return Err(AuthError::InvalidClient(
                        "Client ID and Secret required for Basic auth".to_string(),
                    ));
                }
                headers.push((
                    "Authorization".to_string(),
                    basic_auth(client_id, client_secret),
                ));
            }
            ClientAuth::Body => {
                params.push(("client_id", client_id));
                params.push(("client_secret", client_secret));
            }
        }

        if let Some(extra) = token_extra_params {
            for (key, value) in extra {
                params.push((key.as_str(), value.as_str()));
            }
        }

        headers.push((
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ));

        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();

        Ok(Self {
            grant_type: grant_type.clone(),
            token_url: token_url.to_string(),
            headers,
            body,
        })
    }
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .ok_or(AuthError::MissingCredentials(field))
}

/// Fields of a successful token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<u64>,
}

impl TokenResponse {
    /// Converts the token into an `Authorization` header result.
    ///
    /// `expires_at` is `now + expires_in - 300` when the server sent an expiry.
    pub fn into_auth_result(self, now: i64) -> AuthResult {
        let mut result = AuthResult::with_header(
            "Authorization",
            format!("{} {}", self.token_type, self.access_token),
        );
        result.expires_at = self
            .expires_in
            .map(|secs| now + secs as i64 - EXPIRY_SKEW_SECS);
        result
    }
}

/// Parses a token endpoint response body.
///
/// JSON is tried first, accepting snake_case and camelCase keys and surfacing
/// the `{"error", "error_description"}` shape. A form-encoded body is tried
/// next.
pub fn parse_token_response(body: &[u8]) -> Result<TokenResponse, AuthError> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        if let Some(error) = value.get("error").and_then(Value::as_str) {
            let description = value
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or("");
            return Err(AuthError::TokenEndpoint {
                error: error.to_string(),
                description: description.to_string(),
            });
        }

        let field = |snake: &str, camel: &str| value.get(snake).or_else(|| value.get(camel)).cloned();
        let access_token = field("access_token", "accessToken");
        let token_type = field("token_type", "tokenType");
        let expires_in = field("expires_in", "expiresIn").and_then(|v| {
            v.as_u64()
                .or_else(|| v.as_str().and_then(|s| s.parse().ok()))
        });

        if let (Some(Value::String(access_token)), Some(Value::String(token_type))) =
            (access_token, token_type)
        {
            return Ok(TokenResponse {
                access_token,
                token_type,
                expires_in,
            });
        }
    }

    let form: HashMap<String, String> = url::form_urlencoded::parse(body).into_owned().collect();
    if let Some(error) = form.get("error") {
        return Err(AuthError::TokenEndpoint {
            error: error.clone(),
            description: form.get("error_description").cloned().unwrap_or_default(),
        });
    }
    let get = |snake: &str, camel: &str| form.get(snake).or_else(|| form.get(camel)).cloned();
    if let (Some(access_token), Some(token_type)) = (
        get("access_token", "accessToken"),
        get("token_type", "tokenType"),
    ) {
        return Ok(TokenResponse {
            access_token,
            token_type,
            expires_in: get("expires_in", "expiresIn").and_then(|s| s.parse().ok()),
        });
    }

    let preview: String = String::from_utf8_lossy(body).chars().take(120).collect();
    Err(AuthError::InvalidTokenResponse(format!(
        "missing fields; body ({} bytes) begins: {}",
        body.len(),
        preview
    )))
}
