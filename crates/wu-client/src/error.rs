//! Error types for the WU API client.

/// All errors that can occur when talking to the backend or object storage.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing or invalid client configuration.
    #[error("api config error: {0}")]
    Config(String),

    /// The backend answered with a non-success status.
    #[error("API {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the JSON `message` field, or the raw body.
        message: String,
    },

    /// The direct PUT to object storage was rejected.
    #[error("upload failed {status}: {body}")]
    Upload {
        /// HTTP status code from the storage endpoint.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body did not have the shape the caller asked for.
    #[error("unexpected response body: {0}")]
    UnexpectedBody(String),

    /// Network or HTTP client error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Upload { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            Self::Config(_) | Self::UnexpectedBody(_) | Self::Json(_) => None,
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure to obtain the current session from the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The provider could not be reached.
    #[error("session provider unavailable: {0}")]
    Unavailable(String),

    /// Stored credentials were rejected or could not be refreshed.
    #[error("session rejected: {0}")]
    Rejected(String),
}
