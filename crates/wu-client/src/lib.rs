//! API client for the WU wrestler/promoter marketplace backend.
//!
//! Wraps every backend call with bearer-token attachment, JSON
//! (de)serialization and uniform error reporting, and implements the
//! two-step presigned upload flow to object storage.
//!
//! The client never reads ambient globals: its base URLs arrive in an
//! explicit [`ApiConfig`], and the bearer token comes from a
//! [`SessionProvider`] shared with the auth resolver.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wu_client::{ApiClient, ApiConfig, StaticSession};
//!
//! # async fn example() -> Result<(), wu_client::ApiError> {
//! let session = Arc::new(StaticSession::signed_out());
//! let api = ApiClient::new(ApiConfig::new("https://api.example.com"), session)?;
//! for tryout in api.list_tryouts().await? {
//!     println!("{}, {}", tryout.org_name, tryout.city);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod session;
mod types;
mod upload;

pub use error::{ApiError, SessionError};
pub use reqwest::Method;
pub use session::{SessionProvider, SessionTokens, StaticSession};
pub use types::{
    Application, PresignedTarget, PromoterProfile, Tryout, TryoutStatus, UploadOptions,
    WrestlerProfile,
};

use std::sync::Arc;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const USER_AGENT: &str = concat!("wu-client/", env!("CARGO_PKG_VERSION"));

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend API base URL, e.g. `https://api.example.com/prod`.
    pub base_url: String,
    /// Public base URL photos are served from. `None` disables media URLs.
    pub media_base_url: Option<String>,
    /// Per-request timeout. Zero means the default (15 seconds).
    pub timeout: Duration,
}

impl ApiConfig {
    /// Configuration with only an API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            media_base_url: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the media base URL.
    #[must_use]
    pub fn with_media_base_url(mut self, url: impl Into<String>) -> Self {
        self.media_base_url = Some(url.into());
        self
    }
}

/// A decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body served with a JSON content type.
    Json(serde_json::Value),
    /// Any other non-empty body.
    Text(String),
}

impl Payload {
    /// The body as JSON; text bodies become a JSON string.
    #[must_use]
    pub fn into_json(self) -> serde_json::Value {
        match self {
            Self::Json(v) => v,
            Self::Text(s) => serde_json::Value::String(s),
        }
    }
}

/// WU backend client.
pub struct ApiClient {
    base_url: String,
    media_base_url: Option<String>,
    http: reqwest::Client,
    session: Arc<dyn SessionProvider>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("media_base_url", &self.media_base_url)
            .finish_non_exhaustive()
    }
}
