//! Versioned store tests: envelopes, migrations and soft failure on read.

use rest_pipeline::config::{
    get_config, load_persisted, reset_config, save_persisted, PipelineConfig, SETTINGS_DOCUMENT,
    SETTINGS_VERSION,
};
use rest_pipeline::store::{
    LoadOutcome, MemoryBlobStore, Migration, MigrationInput, Schema, StoreError, VersionedStore,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionIndex {
    collection_ids: Vec<String>,
}

impl Schema for CollectionIndex {}

/// Version 1 stored a comma-separated `ids` string.
fn migrate_index(input: MigrationInput) -> Result<Value, String> {
    match input.version {
        1 => {
            let ids = input
                .content
                .get("ids")
                .and_then(Value::as_str)
                .ok_or_else(|| "missing ids".to_string())?;
            let ids: Vec<&str> = ids.split(',').filter(|s| !s.is_empty()).collect();
            Ok(json!({ "collectionIds": ids }))
        }
        other => Err(format!("cannot migrate from {}", other)),
    }
}

const INDEX_MIGRATION: &Migration = &migrate_index;
const INDEX: &str = "collections/.index.json";

fn envelope(version: u32, content: Value) -> Value {
    json!({
        "header": { "version": version, "updated": "2024-01-01T00:00:00Z" },
        "content": content
    })
}

#[tokio::test]
async fn test_old_document_is_migrated_and_resaved() {
    let backend = Arc::new(MemoryBlobStore::new());
    backend.insert(INDEX, envelope(1, json!({ "ids": "a,b,,c" })));
    let store = VersionedStore::new(backend.clone());

    let outcome = store
        .load::<CollectionIndex>(INDEX, 2, Some(INDEX_MIGRATION))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        LoadOutcome::Loaded(CollectionIndex {
            collection_ids: vec!["a".into(), "b".into(), "c".into()]
        })
    );

    let saved = backend.get(INDEX).unwrap();
    assert_eq!(saved["header"]["version"], 2);
    assert_eq!(saved["content"]["collectionIds"], json!(["a", "b", "c"]));

    // Already current: no migration and no further save.
    let saves = backend.save_count();
    store
        .load::<CollectionIndex>(INDEX, 2, Some(INDEX_MIGRATION))
        .await
        .unwrap();
    assert_eq!(backend.save_count(), saves);
}

#[tokio::test]
async fn test_failed_migration_is_an_error() {
    let backend = Arc::new(MemoryBlobStore::new());
    backend.insert(INDEX, envelope(0, json!({})));
    let store = VersionedStore::new(backend.clone());

    let err = store
        .load::<CollectionIndex>(INDEX, 2, Some(INDEX_MIGRATION))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MigrationFailed { from_version: 0, .. }));
    assert_eq!(backend.save_count(), 0);
}

#[tokio::test]
async fn test_garbage_document_is_corrupt_not_error() {
    let backend = Arc::new(MemoryBlobStore::new());
    backend.insert(INDEX, json!({ "no": "envelope" }));
    let store = VersionedStore::new(backend);

    let outcome = store.load::<CollectionIndex>(INDEX, 2, None).await.unwrap();
    assert!(matches!(outcome, LoadOutcome::Corrupt(_)));

    let fallback: CollectionIndex = store.load_or_default(INDEX, 2, None).await.unwrap();
    assert_eq!(fallback, CollectionIndex::default());
}

#[tokio::test]
async fn test_read_only_store_never_writes() {
    let backend = Arc::new(MemoryBlobStore::new());
    backend.insert(INDEX, envelope(1, json!({ "ids": "x" })));
    let store = VersionedStore::read_only(backend.clone());

    let loaded = store
        .load::<CollectionIndex>(INDEX, 2, Some(INDEX_MIGRATION))
        .await
        .unwrap()
        .loaded()
        .unwrap();
    assert_eq!(loaded.collection_ids, vec!["x".to_string()]);

    store.delete(INDEX).await.unwrap();
    assert_eq!(backend.save_count(), 0);
    assert_eq!(backend.get(INDEX).unwrap()["header"]["version"], 1);
}

#[tokio::test]
#[serial]
async fn test_settings_round_trip_through_global_config() {
    let backend = Arc::new(MemoryBlobStore::new());
    let store = VersionedStore::new(backend.clone());

    let config = PipelineConfig {
        timeout_secs: 45,
        redact_sensitive_logs: false,
        ..Default::default()
    };
    save_persisted(&store, &config).await.unwrap();
    assert_eq!(
        backend.get(SETTINGS_DOCUMENT).unwrap()["header"]["version"],
        SETTINGS_VERSION
    );

    reset_config();
    let loaded = load_persisted(&store).await.unwrap();
    assert_eq!(loaded, config);
    assert_eq!(get_config().timeout_secs, 45);
    reset_config();
}

#[cfg(feature = "native")]
mod fs_backend {
    use super::*;
    use rest_pipeline::store::FsBlobStore;

    #[tokio::test]
    async fn test_migration_on_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("collections");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(
            path.join(".index.json"),
            envelope(1, json!({ "ids": "one,two" })).to_string(),
        )
        .unwrap();

        let store = VersionedStore::new(Arc::new(FsBlobStore::new(dir.path())));
        let loaded = store
            .load::<CollectionIndex>(INDEX, 2, Some(INDEX_MIGRATION))
            .await
            .unwrap()
            .loaded()
            .unwrap();
        assert_eq!(loaded.collection_ids, vec!["one".to_string(), "two".to_string()]);

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(path.join(".index.json")).unwrap()).unwrap();
        assert_eq!(on_disk["header"]["version"], 2);
    }

    #[tokio::test]
    async fn test_secure_values_are_ciphertext_on_disk() {
        use rest_pipeline::store::SecureBlobStore;

        #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
        struct Secret {
            name: String,
            value: String,
            secure: bool,
        }
        #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
        struct Vault {
            secrets: Vec<Secret>,
        }
        impl Schema for Vault {}

        let dir = tempfile::TempDir::new().unwrap();
        let key = [3u8; 32];
        let store = VersionedStore::new(Arc::new(SecureBlobStore::new(
            Arc::new(FsBlobStore::new(dir.path())),
            &key,
        )));
        let vault = Vault {
            secrets: vec![
                Secret { name: "token".into(), value: "hunter2".into(), secure: true },
                Secret { name: "region".into(), value: "eu-west-1".into(), secure: false },
            ],
        };
        store.save("environments/prod.json", &vault, 1).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join("environments/prod.json")).unwrap();
        assert!(!raw.contains("hunter2"));
        assert!(raw.contains("eu-west-1"));

        let loaded = store
            .load::<Vault>("environments/prod.json", 1, None)
            .await
            .unwrap()
            .loaded()
            .unwrap();
        assert_eq!(loaded, vault);
    }
}
