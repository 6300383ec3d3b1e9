//! Browser-style storage for the WU marketplace client.
//!
//! This crate defines the [`WebStorage`] trait, a string key-value interface
//! modelled on the two scopes a page has: session storage (one browser
//! session) and local storage (persistent). It knows nothing about auth or
//! profiles; callers own their key names and value encodings.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStorage`]: in-memory, the natural session scope
//! - [`JsonFileStorage`]: a JSON file on disk, used as local scope by the CLI

mod error;
mod file;
mod memory;

use std::sync::Arc;

pub use error::StorageError;
pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// A pluggable string key-value store.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait WebStorage: Send + Sync + 'static {
    /// Retrieve a value by key. Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store a value, overwriting any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Remove`] if the underlying backend fails.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently stored, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// The two storage scopes available to a page.
#[derive(Clone)]
pub struct BrowserStorage {
    /// Session-scoped storage (cleared when the browser session ends).
    pub session: Arc<dyn WebStorage>,
    /// Persistent local storage.
    pub local: Arc<dyn WebStorage>,
}

impl BrowserStorage {
    /// Bundle explicit session and local stores.
    #[must_use]
    pub fn new(session: Arc<dyn WebStorage>, local: Arc<dyn WebStorage>) -> Self {
        Self { session, local }
    }

    /// Fresh in-memory stores for both scopes.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()))
    }
}

impl std::fmt::Debug for BrowserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserStorage").finish_non_exhaustive()
    }
}
