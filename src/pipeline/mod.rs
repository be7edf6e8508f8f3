//! Request execution pipeline.
//!
//! Runs one saved request end to end:
//!
//! 1. resolve `{{variables}}` against the active environment;
//! 2. obtain credentials, from the credentials cache when possible;
//! 3. assemble the wire request;
//! 4. send it through the [`Transport`];
//! 5. classify the response;
//! 6. cache freshly obtained credentials when the scheme allows it.

pub mod error;

pub use error::PipelineError;

use crate::assembler::assemble;
use crate::auth::{AuthProvider, DefaultAuthProvider};
use crate::cache::{generate_cache_key, generate_collection_cache_key, CredentialsCache};
use crate::classifier::classify;
use crate::config::{get_config, PipelineConfig};
use crate::environment::Environment;
use crate::logging::{format_headers, is_sensitive_query_param, redact_query};
use crate::models::{AuthConfig, AuthResult, ClassifiedResponse, RequestDefinition};
use crate::transport::{Transport, TransportRequest};
use crate::variables::{resolve_auth_config, resolve_request};
use std::collections::BTreeMap;
use std::sync::Arc;

const LOG_TARGET: &str = "rest_pipeline::pipeline";

/// The collection a request belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionContext {
    pub id: String,
    /// Used by requests whose authentication is `inherit`.
    pub authentication: AuthConfig,
}

/// Per-execution inputs besides the request itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionContext {
    pub environment: Option<Environment>,
    pub collection: Option<CollectionContext>,
    /// Correlation id for logs and cancellation. Generated when absent.
    pub correlation_id: Option<String>,
}

/// Orchestrates resolution, authentication, assembly, transport and classification.
pub struct RequestPipeline {
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthProvider>,
    cache: Arc<CredentialsCache>,
    config: PipelineConfig,
}

/// Credentials to use for one execution and where they are cached.
struct EffectiveAuth {
    config: AuthConfig,
    cache_key: String,
}

impl RequestPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        auth: Arc<dyn AuthProvider>,
        cache: Arc<CredentialsCache>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            transport,
            auth,
            cache,
            config,
        }
    }

    /// Builds a pipeline with the default auth provider, a fresh cache and
    /// the global configuration.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let config = get_config();
        let auth = DefaultAuthProvider::new(Arc::clone(&transport))
            .with_options(config.apply_defaults(&Default::default()));
        Self::new(
            transport,
            Arc::new(auth),
            Arc::new(CredentialsCache::new()),
            config,
        )
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CredentialsCache> {
        &self.cache
    }

    /// Executes a request.
    ///
    /// # Arguments
    ///
    /// * `request` - The saved request, placeholders unresolved
    /// * `context` - Environment, owning collection and correlation id
    ///
    /// # Returns
    ///
    /// The classified response. Non-2xx statuses are responses, not errors.
    pub async fn execute(
        &self,
        request: &RequestDefinition,
        context: &ExecutionContext,
    ) -> Result<ClassifiedResponse, PipelineError> {
        let correlation_id = context
            .correlation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        log::info!(
            target: LOG_TARGET,
            "[{}] Executing request {} ({} {})",
            correlation_id,
            request.id,
            request.method,
            log_url(&request.url, None, self.config.redact_sensitive_logs)
        );

        let resolved = resolve_request(request, context.environment.as_ref());
        let effective = self.effective_auth(&resolved, context);
        let (auth_result, fresh) = self.obtain_credentials(&effective, &correlation_id).await?;

        let assembled = assemble(&resolved, &auth_result)?;
        let options = self.config.apply_defaults(&resolved.options);
        let transport_request = TransportRequest::from_assembled(
            correlation_id.clone(),
            assembled,
            options,
            self.config.preview_max_bytes,
        );
        log::debug!(
            target: LOG_TARGET,
            "[{}] {} {} headers: {}",
            correlation_id,
            transport_request.method,
            log_url(
                &transport_request.url,
                auth_result.query.as_ref(),
                self.config.redact_sensitive_logs
            ),
            format_headers(&transport_request.headers, self.config.redact_sensitive_logs)
        );

        let raw = self.transport.send(transport_request).await?;
        log::debug!(
            target: LOG_TARGET,
            "[{}] Response headers: {}",
            correlation_id,
            format_headers(&raw.headers, self.config.redact_sensitive_logs)
        );

        let response = classify(raw, self.config.preview_max_bytes)?;

        if fresh && effective.config.is_cacheable() {
            self.cache.set(&effective.cache_key, &auth_result)?;
        }

        log::info!(
            target: LOG_TARGET,
            "[{}] Completed with {} {} ({} bytes, {} ms)",
            correlation_id,
            response.status,
            response.status_text,
            response.size,
            response.duration
        );
        Ok(response)
    }

    /// Cancels an in-flight execution by correlation id.
    pub async fn cancel(&self, correlation_id: &str) -> Result<(), PipelineError> {
        self.transport.cancel(correlation_id).await?;
        Ok(())
    }

    /// Drops cached credentials owned by a request.
    pub fn invalidate_request_auth(&self, request_id: &str) {
        self.cache.remove(&generate_cache_key(request_id));
    }

    /// Drops cached credentials owned by a collection.
    pub fn invalidate_collection_auth(&self, collection_id: &str) {
        self.cache.remove(&generate_collection_cache_key(collection_id));
    }

    /// Picks the auth config for `request`, following `inherit` to the collection.
    fn effective_auth(&self, request: &RequestDefinition, context: &ExecutionContext) -> EffectiveAuth {
        let variables = context
            .environment
            .as_ref()
            .map(Environment::enabled_variables)
            .unwrap_or_default();

        match (&request.authentication, &context.collection) {
            (AuthConfig::Inherit, Some(collection)) => EffectiveAuth {
                config: resolve_auth_config(&collection.authentication, &variables),
                cache_key: generate_collection_cache_key(&collection.id),
            },
            (AuthConfig::Inherit, None) => EffectiveAuth {
                config: AuthConfig::None,
                cache_key: generate_cache_key(&request.id),
            },
            (config, _) => EffectiveAuth {
                config: resolve_auth_config(config, &variables),
                cache_key: generate_cache_key(&request.id),
            },
        }
    }

    /// Returns the credentials and whether they were just produced.
    async fn obtain_credentials(
        &self,
        effective: &EffectiveAuth,
        correlation_id: &str,
    ) -> Result<(AuthResult, bool), PipelineError> {
        match &effective.config {
            AuthConfig::None | AuthConfig::Inherit => return Ok((AuthResult::default(), false)),
            config if config.is_cacheable() => {
                if let Some(cached) = self.cache.get(&effective.cache_key)? {
                    log::debug!(
                        target: LOG_TARGET,
                        "[{}] Using cached credentials {}",
                        correlation_id,
                        effective.cache_key
                    );
                    return Ok((cached, false));
                }
            }
            _ => {}
        }

        let result = self
            .auth
            .authenticate(&effective.config, Some(correlation_id))
            .await?;
        Ok((result, true))
    }
}

/// Renders `url` for a log line, masking credential query values.
///
/// `auth_query` holds the parameters the auth scheme placed in the query.
fn log_url(url: &str, auth_query: Option<&BTreeMap<String, String>>, redact: bool) -> String {
    if !redact {
        return url.to_string();
    }
    redact_query(url, |name| {
        is_sensitive_query_param(name) || auth_query.is_some_and(|query| query.contains_key(name))
    })
}
