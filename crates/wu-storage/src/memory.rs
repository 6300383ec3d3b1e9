//! In-memory storage backend.
//!
//! Stores all data in a `BTreeMap` behind a `RwLock`. Nothing survives the
//! process, which is exactly the lifetime of session-scoped storage.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageError, WebStorage};

/// An in-memory storage backend backed by a `BTreeMap`.
///
/// Clones share the same underlying map, so a clone handed to another
/// component observes every write.
///
/// # Examples
///
/// ```
/// # use wu_storage::{MemoryStorage, WebStorage};
/// # #[tokio::main]
/// # async fn main() {
/// let storage = MemoryStorage::new();
/// storage.set("wu:flag", "1").await.unwrap();
/// assert_eq!(storage.get("wu:flag").await.unwrap(), Some("1".to_owned()));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl WebStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data.keys().cloned().collect())
    }
}
