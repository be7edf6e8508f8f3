//! Versioned document storage
//!
//! Every persisted slice (requests, collections, settings) is stored as a
//! [`StoredDocument`]: a `{header: {version, updated}, content}` envelope. On
//! load, content written under an older schema version is passed through a
//! caller-supplied migration and re-saved under the current version.
//!
//! Read paths degrade softly: a missing or unreadable document is reported
//! as [`LoadOutcome::NotFound`] or [`LoadOutcome::Corrupt`] so callers can
//! fall back to defaults. A failing migration is a hard [`StoreError`].
//!
//! # Example
//!
//! ```
//! use rest_pipeline::store::{LoadOutcome, MemoryBlobStore, Schema, VersionedStore};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
//! struct Counter {
//!     value: u32,
//! }
//! impl Schema for Counter {}
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = VersionedStore::new(Arc::new(MemoryBlobStore::new()));
//! store.save("counter.json", &Counter { value: 3 }, 1).await.unwrap();
//! let loaded = store.load::<Counter>("counter.json", 1, None).await.unwrap();
//! assert_eq!(loaded, LoadOutcome::Loaded(Counter { value: 3 }));
//! # }
//! ```

pub mod error;
#[cfg(feature = "native")]
pub mod fs;
pub mod memory;
pub mod secure;

pub use error::{BlobError, StoreError};
#[cfg(feature = "native")]
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use secure::SecureBlobStore;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Key/value persistence for JSON documents.
///
/// Names are slash-delimited logical paths such as `collections/.index.json`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads a document. A missing document is [`BlobError::NotFound`].
    async fn load(&self, name: &str) -> Result<Value, BlobError>;

    /// Writes a document, replacing any previous one.
    async fn save(&self, name: &str, value: &Value) -> Result<(), BlobError>;

    /// Removes a document. A missing document is [`BlobError::NotFound`].
    async fn delete(&self, name: &str) -> Result<(), BlobError>;
}

/// A type persisted through [`VersionedStore`].
pub trait Schema: Serialize + DeserializeOwned + Default + Send + Sync {
    /// Semantic checks beyond deserialization.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Envelope header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentHeader {
    pub version: u32,
    /// RFC 3339 time of the last save.
    pub updated: String,
}

/// Versioned envelope around persisted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument<S> {
    pub header: DocumentHeader,
    pub content: S,
}

/// What a migration function receives.
#[derive(Debug, Clone)]
pub struct MigrationInput {
    pub content: Value,
    /// Version the content was written under.
    pub version: u32,
    pub file_name: String,
}

/// Converts content from an older schema version to the current one.
pub type Migration = dyn Fn(MigrationInput) -> Result<Value, String> + Send + Sync;

/// Result of [`VersionedStore::load`].
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<S> {
    Loaded(S),
    NotFound,
    /// The document exists but could not be parsed or failed validation.
    Corrupt(String),
}

impl<S> LoadOutcome<S> {
    /// Returns the loaded value, if any.
    pub fn loaded(self) -> Option<S> {
        match self {
            LoadOutcome::Loaded(value) => Some(value),
            _ => None,
        }
    }
}

/// Schema-validated, versioned access to a [`BlobStore`].
#[derive(Clone)]
pub struct VersionedStore {
    backend: Arc<dyn BlobStore>,
    read_only: bool,
}

impl VersionedStore {
    /// Creates a writable store.
    pub fn new(backend: Arc<dyn BlobStore>) -> Self {
        Self {
            backend,
            read_only: false,
        }
    }

    /// Creates a store whose `save` and `delete` succeed without side effects.
    pub fn read_only(backend: Arc<dyn BlobStore>) -> Self {
        Self {
            backend,
            read_only: true,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Loads and validates a document, migrating it when needed.
    ///
    /// # Arguments
    ///
    /// * `name` - Logical document name
    /// * `current_version` - Schema version the caller understands
    /// * `migrate` - Applied when the stored version differs from `current_version`
    ///
    /// # Returns
    ///
    /// `Loaded`, `NotFound` or `Corrupt`. A failed migration or a backend
    /// failure other than "not found" is an error. After a successful
    /// migration the document is re-saved once under `current_version`;
    /// a failure of that save is logged and does not affect the result.
    pub async fn load<S: Schema>(
        &self,
        name: &str,
        current_version: u32,
        migrate: Option<&Migration>,
    ) -> Result<LoadOutcome<S>, StoreError> {
        let raw = match self.backend.load(name).await {
            Ok(raw) => raw,
            Err(BlobError::NotFound(_)) => return Ok(LoadOutcome::NotFound),
            Err(BlobError::Parse(reason)) => return Ok(corrupt(name, reason)),
            Err(err) => return Err(err.into()),
        };

        let envelope: StoredDocument<Value> = match serde_json::from_value(raw) {
            Ok(envelope) => envelope,
            Err(e) => return Ok(corrupt(name, format!("invalid envelope: {}", e))),
        };

        let stored_version = envelope.header.version;
        let mut content = envelope.content;
        let mut migrated = false;

        if stored_version != current_version {
            if let Some(migrate) = migrate {
                log::info!(
                    target: "rest_pipeline::store",
                    "Migrating {} from version {} to {}",
                    name,
                    stored_version,
                    current_version
                );
                content = migrate(MigrationInput {
                    content,
                    version: stored_version,
                    file_name: name.to_string(),
                })
                .map_err(|message| StoreError::MigrationFailed {
                    name: name.to_string(),
                    from_version: stored_version,
                    message,
                })?;
                migrated = true;
            }
        }

        let value: S = match serde_json::from_value(content) {
            Ok(value) => value,
            Err(e) => return Ok(corrupt(name, format!("schema mismatch: {}", e))),
        };
        if let Err(reason) = value.validate() {
            return Ok(corrupt(name, reason));
        }

        if migrated {
            if let Err(e) = self.save(name, &value, current_version).await {
                log::error!(
                    target: "rest_pipeline::store",
                    "Failed to save migrated {}: {}",
                    name,
                    e
                );
            }
        }

        Ok(LoadOutcome::Loaded(value))
    }

    /// Loads a document, falling back to `S::default()` when it is missing or corrupt.
    pub async fn load_or_default<S: Schema>(
        &self,
        name: &str,
        current_version: u32,
        migrate: Option<&Migration>,
    ) -> Result<S, StoreError> {
        Ok(self
            .load(name, current_version, migrate)
            .await?
            .loaded()
            .unwrap_or_default())
    }

    /// Saves `content` under `current_version`.
    pub async fn save<S: Serialize + Sync>(
        &self,
        name: &str,
        content: &S,
        current_version: u32,
    ) -> Result<(), StoreError> {
        if self.read_only {
            return Ok(());
        }
        let document = StoredDocument {
            header: DocumentHeader {
                version: current_version,
                updated: chrono::Utc::now().to_rfc3339(),
            },
            content,
        };
        let value =
            serde_json::to_value(&document).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.backend.save(name, &value).await?;
        log::debug!(target: "rest_pipeline::store", "Saved {} (version {})", name, current_version);
        Ok(())
    }

    /// Deletes a document. Deleting a missing document succeeds.
    pub async fn delete(&self, name: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Ok(());
        }
        match self.backend.delete(name).await {
            Ok(()) | Err(BlobError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

fn corrupt<S>(name: &str, reason: String) -> LoadOutcome<S> {
    log::warn!(target: "rest_pipeline::store", "Ignoring unreadable {}: {}", name, reason);
    LoadOutcome::Corrupt(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Workspace {
        name: String,
        request_ids: Vec<String>,
    }

    impl Schema for Workspace {
        fn validate(&self) -> Result<(), String> {
            if self.name.is_empty() {
                return Err("name must not be empty".to_string());
            }
            Ok(())
        }
    }

    fn envelope(version: u32, content: Value) -> Value {
        json!({"header": {"version": version, "updated": "2024-01-01T00:00:00Z"}, "content": content})
    }

    fn store_with(name: &str, value: Value) -> (Arc<MemoryBlobStore>, VersionedStore) {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.insert(name, value);
        let store = VersionedStore::new(backend.clone());
        (backend, store)
    }

    const RENAME: &Migration = &rename_migration;

    fn rename_migration(input: MigrationInput) -> Result<Value, String> {
        let mut content = input.content;
        let title = content
            .get("title")
            .cloned()
            .ok_or_else(|| "missing title".to_string())?;
        content["name"] = title;
        Ok(content)
    }

    #[tokio::test]
    async fn test_missing_document_is_not_found() {
        let store = VersionedStore::new(Arc::new(MemoryBlobStore::new()));
        let outcome = store.load::<Workspace>("ws.json", 2, None).await.unwrap();
        assert_eq!(outcome, LoadOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_current_version_loads() {
        let (backend, store) = store_with(
            "ws.json",
            envelope(2, json!({"name": "main", "requestIds": ["a"]})),
        );
        let outcome = store.load::<Workspace>("ws.json", 2, None).await.unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Loaded(Workspace {
                name: "main".to_string(),
                request_ids: vec!["a".to_string()]
            })
        );
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_envelope_is_corrupt() {
        let (_, store) = store_with("ws.json", json!({"content": {}}));
        let outcome = store.load::<Workspace>("ws.json", 2, None).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_schema_violation_is_corrupt() {
        let (_, store) = store_with("ws.json", envelope(2, json!({"name": "", "requestIds": []})));
        let outcome = store.load::<Workspace>("ws.json", 2, None).await.unwrap();
        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));

        let fallback: Workspace = store.load_or_default("ws.json", 2, None).await.unwrap();
        assert_eq!(fallback, Workspace::default());
    }

    #[tokio::test]
    async fn test_migration_resaves_once() {
        let (backend, store) = store_with(
            "ws.json",
            envelope(1, json!({"title": "legacy", "requestIds": []})),
        );
        let outcome = store
            .load::<Workspace>("ws.json", 2, Some(RENAME))
            .await
            .unwrap();

        assert_eq!(outcome.loaded().unwrap().name, "legacy");
        assert_eq!(backend.save_count(), 1);
        let saved = backend.get("ws.json").unwrap();
        assert_eq!(saved["header"]["version"], 2);
        assert_eq!(saved["content"]["name"], "legacy");
    }

    #[tokio::test]
    async fn test_migration_failure_is_an_error() {
        let (backend, store) = store_with("ws.json", envelope(1, json!({"requestIds": []})));
        let result = store
            .load::<Workspace>("ws.json", 2, Some(RENAME))
            .await;

        assert!(matches!(result, Err(StoreError::MigrationFailed { from_version: 1, .. })));
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_migrated_content_failing_schema_is_corrupt_and_not_saved() {
        let (backend, store) = store_with("ws.json", envelope(1, json!({"title": "", "requestIds": []})));
        let outcome = store
            .load::<Workspace>("ws.json", 2, Some(RENAME))
            .await
            .unwrap();
        assert!(matches!(outcome, LoadOutcome::Corrupt(_)));
        assert_eq!(backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_read_only_store_does_not_write() {
        let backend = Arc::new(MemoryBlobStore::new());
        backend.insert("ws.json", envelope(1, json!({"title": "legacy", "requestIds": []})));
        let store = VersionedStore::read_only(backend.clone());

        store.save("other.json", &Workspace::default(), 2).await.unwrap();
        store.delete("ws.json").await.unwrap();
        let outcome = store
            .load::<Workspace>("ws.json", 2, Some(RENAME))
            .await
            .unwrap();

        assert!(matches!(outcome, LoadOutcome::Loaded(_)));
        assert_eq!(backend.save_count(), 0);
        assert!(backend.get("other.json").is_none());
        assert!(backend.get("ws.json").is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_document_succeeds() {
        let store = VersionedStore::new(Arc::new(MemoryBlobStore::new()));
        store.delete("nothing.json").await.unwrap();
    }
}
