//! Storage error types.
//!
//! Every error variant carries the key or path it failed on so a log line is
//! enough to diagnose the problem.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the backing file at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to storage.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to remove a key from storage.
    #[error("failed to remove key '{key}': {reason}")]
    Remove { key: String, reason: String },

    /// The persisted document is not a JSON object of strings.
    #[error("corrupt storage file '{path}': {reason}")]
    Corrupt { path: String, reason: String },
}
