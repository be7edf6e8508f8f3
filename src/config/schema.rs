//! Configuration schema for the request pipeline.
//!
//! Defines the user-configurable settings and their validation. Every field
//! has its own serde default so partial settings objects deserialize cleanly.

use crate::models::RequestOptions;
use crate::store::Schema;
use serde::{Deserialize, Serialize};

/// Pipeline settings.
///
/// Read from the `"rest-pipeline"` settings key or from the persisted
/// `settings.json` document. Missing settings fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Request timeout in seconds. Must be greater than 0.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Response bodies larger than this are spilled to a temp file and not
    /// previewed. Defaults to 20 MiB.
    #[serde(default = "default_preview_max_bytes")]
    pub preview_max_bytes: u64,

    /// Maximum number of redirects to follow when `follow_redirects` is on.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Accept invalid TLS certificates for every request.
    ///
    /// **Warning:** only for local development servers.
    #[serde(default)]
    pub disable_ssl: bool,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Replace sensitive header values with a placeholder in log output.
    #[serde(default = "default_redact_sensitive_logs")]
    pub redact_sensitive_logs: bool,

    /// Open persisted documents read-only; saves and deletes become no-ops.
    #[serde(default)]
    pub read_only_store: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            preview_max_bytes: default_preview_max_bytes(),
            max_redirects: default_max_redirects(),
            follow_redirects: default_follow_redirects(),
            disable_ssl: false,
            user_agent: default_user_agent(),
            redact_sensitive_logs: default_redact_sensitive_logs(),
            read_only_store: false,
        }
    }
}

impl PipelineConfig {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all settings are valid, or `Err` with a descriptive message.
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("timeoutSecs must be greater than 0".to_string());
        }
        if self.preview_max_bytes == 0 {
            return Err("previewMaxBytes must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    /// Merges this configuration with another, using values from `other`.
    pub fn merge(&self, other: &PipelineConfig) -> Self {
        Self {
            timeout_secs: other.timeout_secs,
            preview_max_bytes: other.preview_max_bytes,
            max_redirects: other.max_redirects,
            follow_redirects: other.follow_redirects,
            disable_ssl: other.disable_ssl,
            user_agent: other.user_agent.clone(),
            redact_sensitive_logs: other.redact_sensitive_logs,
            read_only_store: other.read_only_store,
        }
    }

    /// Fills the unset fields of per-request options from these settings.
    ///
    /// Options set on the request always win.
    pub fn apply_defaults(&self, options: &RequestOptions) -> RequestOptions {
        let redirects = if self.follow_redirects {
            self.max_redirects
        } else {
            0
        };
        RequestOptions {
            timeout_secs: options.timeout_secs.or(Some(self.timeout_secs)),
            disable_ssl: options.disable_ssl.or(Some(self.disable_ssl)),
            user_agent: options
                .user_agent
                .clone()
                .or_else(|| Some(self.user_agent.clone())),
            max_redirects: options.max_redirects.or(Some(redirects)),
            ..options.clone()
        }
    }
}

impl Schema for PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        PipelineConfig::validate(self)
    }
}

// Default value functions for serde

fn default_timeout_secs() -> u64 {
    30
}

fn default_preview_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_max_redirects() -> u32 {
    10
}

fn default_follow_redirects() -> bool {
    true
}

fn default_user_agent() -> String {
    format!("rest-pipeline/{}", env!("CARGO_PKG_VERSION"))
}

fn default_redact_sensitive_logs() -> bool {
    true
}
