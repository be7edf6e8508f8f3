//! In-memory blob store.
//!
//! Used by hosts without a filesystem and by tests. Every save is recorded so
//! callers can assert on write traffic.

use super::{BlobError, BlobStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`BlobStore`] holding documents in a concurrent map.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, Value>,
    saves: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document without counting it as a save.
    pub fn insert(&self, name: &str, value: Value) {
        self.blobs.insert(name.to_string(), value);
    }

    /// Returns a copy of the document stored under `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.blobs.get(name).map(|v| v.value().clone())
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn load(&self, name: &str) -> Result<Value, BlobError> {
        self.get(name)
            .ok_or_else(|| BlobError::NotFound(name.to_string()))
    }

    async fn save(&self, name: &str, value: &Value) -> Result<(), BlobError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.blobs.insert(name.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), BlobError> {
        self.blobs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(name.to_string()))
    }
}
