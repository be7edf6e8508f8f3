//! Filesystem blob store.
//!
//! Documents are JSON files under a root directory; the logical name is the
//! relative path. Writes go to a sibling temp file that is then renamed over
//! the target, so a crash never leaves a half-written document.

use super::{BlobError, BlobStore};
use async_trait::async_trait;
use serde_json::Value;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// A [`BlobStore`] backed by files under `root`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a logical name to a path under the root.
    ///
    /// Only plain relative components are accepted.
    fn path_for(&self, name: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(name);
        let valid = !name.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(BlobError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn not_found_or_io(name: &str, err: std::io::Error) -> BlobError {
    if err.kind() == ErrorKind::NotFound {
        BlobError::NotFound(name.to_string())
    } else {
        BlobError::Io(err)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn load(&self, name: &str) -> Result<Value, BlobError> {
        let path = self.path_for(name)?;
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))?;
        serde_json::from_slice(&bytes).map_err(|e| BlobError::Parse(e.to_string()))
    }

    async fn save(&self, name: &str, value: &Value) -> Result<(), BlobError> {
        let path = self.path_for(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(value).map_err(|e| BlobError::Parse(e.to_string()))?;
        let mut tmp: OsString = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<(), BlobError> {
        let path = self.path_for(name)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| not_found_or_io(name, e))
    }
}
