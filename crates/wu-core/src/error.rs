//! Error types for `wu-core`.
//!
//! Auth failures are deliberately absent from the public surface: the
//! resolver degrades them to a signed-out state. What remains are the
//! failures a caller can act on or must log.

use wu_client::ApiError;
use wu_storage::StorageError;

/// Why an identity token could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Not three dot-separated segments.
    #[error("malformed token: expected 3 segments, got {segments}")]
    Malformed { segments: usize },

    /// The payload segment is not valid base64.
    #[error("token payload is not base64: {reason}")]
    Encoding { reason: String },

    /// The decoded payload is not JSON.
    #[error("token payload is not JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but not an object.
    #[error("token payload is not a JSON object")]
    NotObject,
}

/// Failure to fetch a partial's HTML.
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// The placeholder's source attribute is empty.
    #[error("placeholder has an empty include source")]
    EmptySource,

    /// The source does not exist.
    #[error("partial '{url}' not found")]
    NotFound { url: String },

    /// The server answered with a non-success status.
    #[error("partial '{url}' returned HTTP {status}")]
    Http { url: String, status: u16 },

    /// The URL escapes the partial root or cannot be joined to the base.
    #[error("invalid partial url '{url}'")]
    InvalidUrl { url: String },

    /// Network or filesystem failure.
    #[error("failed to fetch partial '{url}': {reason}")]
    Fetch { url: String, reason: String },
}

/// Failure of a single boot module. Never aborts the boot sequence.
#[derive(Debug, thiserror::Error)]
pub enum BootError {
    /// A module needs the API client but it was never constructed.
    #[error("api client not initialized (config or api-client module did not run)")]
    MissingApi,

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Browser storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The module panicked.
    #[error("module panicked: {0}")]
    Panicked(String),
}
