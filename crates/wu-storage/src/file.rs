//! JSON-file storage backend.
//!
//! Persists the whole store as one JSON object of string values. Every
//! mutation rewrites the file through a temporary sibling and a rename, so a
//! crash mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::{StorageError, WebStorage};

/// A storage backend persisted to a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl JsonFileStorage {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; the file is created on first write.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the file exists but cannot be read,
    /// or [`StorageError::Corrupt`] if it is not a JSON object of strings.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => parse_document(&path, &text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StorageError::Open {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };
        debug!(path = %path.display(), entries = data.len(), "opened file storage");
        Ok(Self {
            path,
            data: Arc::new(RwLock::new(data)),
        })
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, data: &BTreeMap<String, String>, key: &str) -> Result<(), StorageError> {
        let write_err = |reason: String| StorageError::Write {
            key: key.to_owned(),
            reason,
        };
        let text = serde_json::to_string_pretty(data).map_err(|e| write_err(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| write_err(e.to_string()))?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| write_err(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| write_err(e.to_string()))
    }
}

fn parse_document(path: &Path, text: &str) -> Result<BTreeMap<String, String>, StorageError> {
    serde_json::from_str(text).map_err(|e| StorageError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[async_trait::async_trait]
impl WebStorage for JsonFileStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    // Mutations are staged on a copy and only committed once the file is
    // written, so memory never gets ahead of disk.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let mut staged = data.clone();
        staged.insert(key.to_owned(), value.to_owned());
        self.flush(&staged, key).await?;
        *data = staged;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        if !data.contains_key(key) {
            return Ok(());
        }
        let mut staged = data.clone();
        staged.remove(key);
        self.flush(&staged, key).await.map_err(|e| StorageError::Remove {
            key: key.to_owned(),
            reason: e.to_string(),
        })?;
        *data = staged;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.keys().cloned().collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path().join("local.json"))
            .await
            .unwrap();
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn writes_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let storage = JsonFileStorage::open(&path).await.unwrap();
        storage.set("wu:user-summary", "{\"a\":1}").await.unwrap();
        storage.set("other", "x").await.unwrap();
        storage.remove("other").await.unwrap();

        let reopened = JsonFileStorage::open(&path).await.unwrap();
        assert_eq!(
            reopened.get("wu:user-summary").await.unwrap(),
            Some("{\"a\":1}".to_owned())
        );
        assert_eq!(reopened.get("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_write_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("local.json");
        let storage = JsonFileStorage::open(&path).await.unwrap();
        storage.set("kept", "1").await.unwrap();

        // Replace the parent directory with a plain file so writes fail.
        std::fs::remove_dir_all(dir.path().join("state")).unwrap();
        std::fs::write(dir.path().join("state"), "not a directory").unwrap();

        let result = storage.set("lost", "2").await;
        assert!(matches!(result, Err(StorageError::Write { .. })));
        assert_eq!(storage.get("lost").await.unwrap(), None);

        let result = storage.remove("kept").await;
        assert!(matches!(result, Err(StorageError::Remove { .. })));
        assert_eq!(storage.get("kept").await.unwrap(), Some("1".to_owned()));
        assert_eq!(storage.keys().await.unwrap(), vec!["kept".to_owned()]);
    }

    #[tokio::test]
    async fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let result = JsonFileStorage::open(&path).await;
        assert!(matches!(result, Err(StorageError::Corrupt { .. })));
    }
}
