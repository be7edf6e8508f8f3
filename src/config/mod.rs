//! Configuration management for the request pipeline.
//!
//! Configuration is loaded from host settings under the `"rest-pipeline"` key
//! or from the persisted `settings.json` document, merged with defaults and
//! held in a process-wide singleton.

pub mod schema;

pub use schema::PipelineConfig;

use crate::store::{Migration, MigrationInput, StoreError, VersionedStore};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::RwLock;

/// Settings key in the host's settings object.
pub const SETTINGS_KEY: &str = "rest-pipeline";

/// Name of the persisted settings document.
pub const SETTINGS_DOCUMENT: &str = "settings.json";

/// Current schema version of [`SETTINGS_DOCUMENT`].
///
/// Version 1 stored the timeout in milliseconds under `timeout`.
pub const SETTINGS_VERSION: u32 = 2;

const LOG_TARGET: &str = "rest_pipeline::config";

const SETTINGS_MIGRATION: &Migration = &migrate_settings;

/// Global configuration instance.
static CONFIG: Lazy<RwLock<PipelineConfig>> = Lazy::new(|| RwLock::new(PipelineConfig::default()));

/// Loads configuration from a host settings object.
///
/// Reads the `"rest-pipeline"` settings, merges them with defaults, validates
/// the result and updates the global configuration. Settings that fail to
/// deserialize are ignored with a warning.
///
/// # Arguments
///
/// * `settings_json` - Optional JSON value containing settings under `"rest-pipeline"`
///
/// # Returns
///
/// `Ok(PipelineConfig)` with the loaded configuration, or `Err` if validation fails.
///
/// # Example
///
/// ```no_run
/// use rest_pipeline::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "rest-pipeline": {
///         "timeoutSecs": 60,
///         "disableSsl": false
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.timeout_secs, 60);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<PipelineConfig, String> {
    let mut config = PipelineConfig::default();

    if let Some(settings) = settings_json.as_ref().and_then(|s| s.get(SETTINGS_KEY)) {
        match serde_json::from_value::<PipelineConfig>(settings.clone()) {
            Ok(user_config) => config = config.merge(&user_config),
            Err(e) => log::warn!(
                target: LOG_TARGET,
                "Failed to parse {} settings: {}. Using defaults.",
                SETTINGS_KEY,
                e
            ),
        }
    }

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {}", e))?;

    set_config(config.clone());
    Ok(config)
}

/// Gets a copy of the current global configuration.
pub fn get_config() -> PipelineConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| PipelineConfig::default())
}

/// Updates the global configuration in place.
///
/// If the result fails validation the configuration is reset to defaults.
///
/// # Example
///
/// ```no_run
/// use rest_pipeline::config::update_config;
///
/// update_config(|config| {
///     config.timeout_secs = 60;
/// });
/// ```
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut PipelineConfig),
{
    if let Ok(mut config) = CONFIG.write() {
        updater(&mut config);

        if let Err(e) = config.validate() {
            log::warn!(
                target: LOG_TARGET,
                "Configuration validation failed after update: {}. Reverting to defaults.",
                e
            );
            *config = PipelineConfig::default();
        }
    }
}

/// Resets the configuration to defaults.
pub fn reset_config() {
    set_config(PipelineConfig::default());
}

fn set_config(config: PipelineConfig) {
    if let Ok(mut global) = CONFIG.write() {
        *global = config;
    }
}

/// Upgrades a stored settings document to [`SETTINGS_VERSION`].
///
/// Version 1 documents carry `timeout` in milliseconds; it becomes
/// `timeoutSecs`, rounded up.
pub fn migrate_settings(input: MigrationInput) -> Result<Value, String> {
    match input.version {
        1 => {
            let Value::Object(mut map) = input.content else {
                return Err(format!("{} content is not an object", input.file_name));
            };
            if let Some(timeout) = map.remove("timeout") {
                let millis = timeout
                    .as_u64()
                    .ok_or_else(|| format!("timeout is not a number: {}", timeout))?;
                let secs = millis.div_ceil(1000).max(1);
                map.entry("timeoutSecs").or_insert(Value::from(secs));
            }
            Ok(Value::Object(map))
        }
        SETTINGS_VERSION => Ok(input.content),
        other => Err(format!("unsupported settings version {}", other)),
    }
}

/// Loads the persisted settings and makes them the global configuration.
///
/// A missing or unreadable document yields the defaults. The document is
/// migrated and re-saved when it was written by an older version.
pub async fn load_persisted(store: &VersionedStore) -> Result<PipelineConfig, StoreError> {
    let config: PipelineConfig = store
        .load_or_default(SETTINGS_DOCUMENT, SETTINGS_VERSION, Some(SETTINGS_MIGRATION))
        .await?;
    set_config(config.clone());
    Ok(config)
}

/// Persists `config` as the settings document.
pub async fn save_persisted(store: &VersionedStore, config: &PipelineConfig) -> Result<(), StoreError> {
    store.save(SETTINGS_DOCUMENT, config, SETTINGS_VERSION).await
}
