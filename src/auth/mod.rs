//! Authentication providers.
//!
//! Turns an [`AuthConfig`] into an [`AuthResult`]: the headers, query
//! parameters, cookies and body fields to merge into the outgoing request.
//! Static schemes (basic, bearer, API key) are computed locally; OAuth 2.0
//! calls the token endpoint through the configured [`Transport`].

pub mod basic;
pub mod bearer;
pub mod discovery;
pub mod oauth2;

use crate::classifier::DEFAULT_PREVIEW_MAX_BYTES;
use crate::models::{AuthConfig, AuthPlacement, AuthResult, HttpMethod, OidcDiscovery, RequestOptions};
use crate::transport::{Transport, TransportError, TransportRequest};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const LOG_TARGET: &str = "rest_pipeline::auth";

/// Default header for API keys without an explicit name.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Default parameter name for tokens placed outside headers.
pub const DEFAULT_TOKEN_PARAM: &str = "access_token";

/// Errors that can occur while producing credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// A field the scheme needs was not configured.
    MissingCredentials(&'static str),
    /// The client credentials cannot be used with the chosen client auth.
    InvalidClient(String),
    /// The scheme cannot be authenticated directly (e.g. `inherit` with no parent).
    UnsupportedScheme(String),
    /// The grant type is not supported.
    UnsupportedGrant(String),
    /// The grant type is recognized but not implemented.
    NotImplemented(String),
    /// The token endpoint answered with an RFC 6749 error.
    TokenEndpoint { error: String, description: String },
    /// The token endpoint answered with something other than a token.
    InvalidTokenResponse(String),
    /// OIDC discovery failed.
    Discovery(String),
    /// The token or discovery request failed in transit.
    Transport(TransportError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingCredentials(field) => write!(f, "{} is required", field),
            AuthError::InvalidClient(msg) => write!(f, "invalid_client: {}", msg),
            AuthError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported authentication scheme: {}", scheme)
            }
            AuthError::UnsupportedGrant(grant) => write!(f, "Unsupported grant type: {}", grant),
            AuthError::NotImplemented(msg) => write!(f, "Not implemented: {}", msg),
            AuthError::TokenEndpoint { error, description } => {
                if description.is_empty() {
                    write!(f, "OAuth token error: {}", error)
                } else {
                    write!(f, "OAuth token error: {} ({})", error, description)
                }
            }
            AuthError::InvalidTokenResponse(msg) => {
                write!(f, "Failed to parse token response: {}", msg)
            }
            AuthError::Discovery(msg) => write!(f, "OIDC discovery failed: {}", msg),
            AuthError::Transport(err) => write!(f, "Token request failed: {}", err),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for AuthError {
    fn from(err: TransportError) -> Self {
        AuthError::Transport(err)
    }
}

/// Produces credentials for a request.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Computes the auth result for `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Scheme and credentials, placeholders already resolved
    /// * `parent_request_id` - Correlation id of the request being authenticated
    async fn authenticate(
        &self,
        config: &AuthConfig,
        parent_request_id: Option<&str>,
    ) -> Result<AuthResult, AuthError>;

    /// Fetches the OIDC discovery document for an issuer URL.
    async fn discover_oidc(&self, url: &str) -> Result<OidcDiscovery, AuthError>;
}

/// The built-in provider.
pub struct DefaultAuthProvider {
    transport: Arc<dyn Transport>,
    options: RequestOptions,
}

impl DefaultAuthProvider {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            options: RequestOptions::default(),
        }
    }

    /// Sets the transport options used for token and discovery requests.
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    async fn fetch_token(&self, config: &AuthConfig, request_id: &str) -> Result<AuthResult, AuthError> {
        let token_request = oauth2::TokenRequest::from_config(config)?;
        log::info!(
            target: LOG_TARGET,
            "[{}] Requesting access token ({}) via POST {}",
            request_id,
            token_request.grant_type,
            token_request.token_url
        );

        let request = TransportRequest {
            request_id: request_id.to_string(),
            url: token_request.token_url,
            method: HttpMethod::POST,
            headers: token_request.headers,
            body: Some(token_request.body.into_bytes()),
            body_file_path: None,
            multipart_parts: None,
            options: self.options.clone(),
            preview_max_bytes: DEFAULT_PREVIEW_MAX_BYTES,
        };
        let response = self.transport.send(request).await?;

        // Metadata only; the body carries the token.
        log::debug!(
            target: LOG_TARGET,
            "[{}] Received token response: status={} content-type={:?} size={}",
            request_id,
            response.status,
            response.content_type(),
            response.body.len()
        );

        let token = oauth2::parse_token_response(&response.body)?;
        log::info!(
            target: LOG_TARGET,
            "[{}] Received authentication token (type={}, expires_in={:?})",
            request_id,
            token.token_type,
            token.expires_in
        );
        Ok(token.into_auth_result(chrono::Utc::now().timestamp()))
    }
}

#[async_trait]
impl AuthProvider for DefaultAuthProvider {
    async fn authenticate(
        &self,
        config: &AuthConfig,
        parent_request_id: Option<&str>,
    ) -> Result<AuthResult, AuthError> {
        let request_id = parent_request_id
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        log::info!(
            target: LOG_TARGET,
            "[{}] Starting authentication ({})",
            request_id,
            config.scheme_name()
        );

        let result = match config {
            AuthConfig::None | AuthConfig::Inherit => AuthResult::default(),
            AuthConfig::Basic { username, password } => AuthResult::with_header(
                "Authorization",
                basic::basic_auth(
                    username.as_deref().unwrap_or_default(),
                    password.as_deref().unwrap_or_default(),
                ),
            ),
            AuthConfig::Bearer {
                token,
                scheme,
                placement,
            } => {
                let token = token.clone().unwrap_or_default();
                let header_value = bearer::bearer_token(scheme.as_deref(), &token);
                place_credential(placement.as_ref(), "Authorization", DEFAULT_TOKEN_PARAM, header_value, token)
            }
            AuthConfig::ApiKey {
                key,
                value,
                placement,
            } => {
                let value = value.clone().unwrap_or_default();
                let key = key.as_deref().filter(|k| !k.trim().is_empty());
                place_credential(
                    placement.as_ref(),
                    key.unwrap_or(DEFAULT_API_KEY_HEADER),
                    key.unwrap_or("api_key"),
                    value.clone(),
                    value,
                )
            }
            AuthConfig::Oauth2 { .. } => self.fetch_token(config, &request_id).await?,
        };

        log::info!(target: LOG_TARGET, "[{}] Authentication complete", request_id);
        Ok(result)
    }

    async fn discover_oidc(&self, url: &str) -> Result<OidcDiscovery, AuthError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let url = discovery::discovery_url(url);
        log::info!(
            target: LOG_TARGET,
            "[{}] Discovering OIDC configuration at {}",
            request_id,
            url
        );

        let request = TransportRequest {
            request_id,
            url,
            method: HttpMethod::GET,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
            body: None,
            body_file_path: None,
            multipart_parts: None,
            options: self.options.clone(),
            preview_max_bytes: DEFAULT_PREVIEW_MAX_BYTES,
        };
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(AuthError::Discovery(format!(
                "{} {}",
                response.status, response.status_text
            )));
        }
        discovery::parse_discovery(&response.body)
    }
}

/// Puts a credential where its placement says.
///
/// Header placements receive `header_value`; query, cookie and body
/// placements receive the bare `raw_value`. Blank names fall back to the
/// given defaults.
fn place_credential(
    placement: Option<&AuthPlacement>,
    default_header: &str,
    default_param: &str,
    header_value: String,
    raw_value: String,
) -> AuthResult {
    fn name_or(name: &Option<String>, default: &str) -> String {
        name.as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(default)
            .to_string()
    }

    let mut result = AuthResult::default();
    match placement {
        None => {
            result = AuthResult::with_header(default_header, header_value);
        }
        Some(AuthPlacement::Header { name }) => {
            result = AuthResult::with_header(name_or(name, default_header), header_value);
        }
        Some(AuthPlacement::Query { name }) => {
            result.query = Some(BTreeMap::from([(name_or(name, default_param), raw_value)]));
        }
        Some(AuthPlacement::Cookie { name }) => {
            result.cookies = Some(BTreeMap::from([(name_or(name, default_param), raw_value)]));
        }
        Some(AuthPlacement::Body { field_name }) => {
            result.body = Some(BTreeMap::from([(
                name_or(field_name, default_param),
                Value::String(raw_value),
            )]));
        }
    }
    result
}
