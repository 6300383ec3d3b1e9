//! Request plumbing and typed endpoints.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::session::SessionProvider;
use crate::types::{Application, PresignedTarget, PromoterProfile, Tryout, WrestlerProfile};
use crate::{ApiClient, ApiConfig, DEFAULT_TIMEOUT, Payload, USER_AGENT};

impl ApiClient {
    /// Create a client from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Config` if the base URL is empty, or
    /// `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig, session: Arc<dyn SessionProvider>) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ApiError::Config(
                "missing API base URL: set WU_API_BASE_URL or the wu-api-base meta tag"
                    .to_owned(),
            ));
        }

        let media_base_url = config
            .media_base_url
            .map(|u| u.trim().trim_end_matches('/').to_owned())
            .filter(|u| !u.is_empty());

        let timeout = if config.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            config.timeout
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self {
            base_url,
            media_base_url,
            http,
            session,
        })
    }

    /// Backend base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Public URL for a stored photo key.
    #[must_use]
    pub fn media_url(&self, photo_key: &str) -> Option<String> {
        let key = photo_key.trim_start_matches('/');
        if key.is_empty() {
            return None;
        }
        if key.starts_with("http://") || key.starts_with("https://") {
            return Some(key.to_owned());
        }
        self.media_base_url
            .as_ref()
            .map(|base| format!("{base}/{key}"))
    }

    /// Issue a request against the backend.
    ///
    /// Attaches the session's bearer token when there is one and sends a
    /// non-`None` body as JSON. Returns `None` for 204/205/304 and for empty
    /// bodies, `Payload::Json` for JSON content types, `Payload::Text`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` for any non-success status, carrying the
    /// JSON `message` field or the raw body text.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Payload>, ApiError> {
        let url = self.url(path);
        debug!(method = %method, url = %url, "api request");

        let mut req = self.http.request(method, &url);
        if let Some(token) = self.bearer().await {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;
        read_response(resp).await
    }

    /// `GET` a JSON document and deserialize it.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::UnexpectedBody` if the response is empty or not
    /// JSON, plus any error from [`request`](Self::request).
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        match self.request(Method::GET, path, None).await? {
            Some(Payload::Json(v)) => Ok(serde_json::from_value(v)?),
            Some(Payload::Text(_)) => Err(ApiError::UnexpectedBody(format!(
                "expected JSON from {path}, got text"
            ))),
            None => Err(ApiError::UnexpectedBody(format!(
                "expected JSON from {path}, got an empty body"
            ))),
        }
    }

    /// `GET` a list endpoint. Accepts a bare array or an `{ "items": [...] }`
    /// envelope.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::UnexpectedBody` if the document is neither shape.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let value = match self.request(Method::GET, path, None).await? {
            Some(Payload::Json(v)) => v,
            Some(Payload::Text(_)) => {
                return Err(ApiError::UnexpectedBody(format!(
                    "expected a JSON list from {path}, got text"
                )));
            }
            None => return Ok(Vec::new()),
        };
        let items = match value {
            Value::Array(_) => value,
            Value::Object(mut map) => map.remove("items").ok_or_else(|| {
                ApiError::UnexpectedBody(format!("{path}: object without an items field"))
            })?,
            other => {
                return Err(ApiError::UnexpectedBody(format!(
                    "{path}: expected a list, got {other}"
                )));
            }
        };
        Ok(serde_json::from_value(items)?)
    }

    // --- Tryouts ---

    /// All published tryouts.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors.
    pub async fn list_tryouts(&self) -> Result<Vec<Tryout>, ApiError> {
        self.get_list("/tryouts").await
    }

    /// Tryouts owned by the signed-in promoter.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors.
    pub async fn my_tryouts(&self) -> Result<Vec<Tryout>, ApiError> {
        self.get_list("/tryouts/mine").await
    }

    /// A single tryout.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors (404 as `ApiError::Status`).
    pub async fn get_tryout(&self, id: &str) -> Result<Tryout, ApiError> {
        self.get_json(&format!("/tryouts/{}", urlencoding::encode(id)))
            .await
    }

    /// Applications submitted to one of the promoter's tryouts.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors.
    pub async fn list_applications(&self, tryout_id: &str) -> Result<Vec<Application>, ApiError> {
        self.get_list(&format!(
            "/applications?tryoutId={}",
            urlencoding::encode(tryout_id)
        ))
        .await
    }

    // --- Profiles ---

    /// Public wrestler directory.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors.
    pub async fn list_wrestlers(&self) -> Result<Vec<WrestlerProfile>, ApiError> {
        self.get_list("/profiles/wrestlers").await
    }

    /// A wrestler's public profile by handle.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors (404 as `ApiError::Status`).
    pub async fn get_wrestler(&self, handle: &str) -> Result<WrestlerProfile, ApiError> {
        self.get_json(&format!(
            "/profiles/wrestlers/{}",
            urlencoding::encode(handle)
        ))
        .await
    }

    /// The signed-in wrestler's own profile; `None` if not created yet.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors other than 404.
    pub async fn my_wrestler_profile(&self) -> Result<Option<WrestlerProfile>, ApiError> {
        not_found_as_none(self.get_json("/profiles/wrestlers/me").await)
    }

    /// Create or replace the signed-in wrestler's profile.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn save_wrestler_profile(&self, profile: &WrestlerProfile) -> Result<(), ApiError> {
        let body = serde_json::to_value(profile)?;
        self.request(Method::PUT, "/profiles/wrestlers/me", Some(&body))
            .await?;
        Ok(())
    }

    /// Update selected fields of the signed-in wrestler's profile.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn patch_wrestler_profile(&self, fields: &Value) -> Result<(), ApiError> {
        self.request(Method::PATCH, "/profiles/wrestlers/me", Some(fields))
            .await?;
        Ok(())
    }

    /// The signed-in promoter's own profile; `None` if not created yet.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors other than 404.
    pub async fn my_promoter_profile(&self) -> Result<Option<PromoterProfile>, ApiError> {
        not_found_as_none(self.get_json("/profiles/promoters/me").await)
    }

    /// Create or replace the signed-in promoter's profile.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn save_promoter_profile(&self, profile: &PromoterProfile) -> Result<(), ApiError> {
        let body = serde_json::to_value(profile)?;
        self.request(Method::PUT, "/profiles/promoters/me", Some(&body))
            .await?;
        Ok(())
    }

    // --- Uploads ---

    /// Ask the backend for a presigned `PUT` target.
    ///
    /// # Errors
    ///
    /// Propagates request and decoding errors.
    pub async fn presign(&self, key: &str, content_type: &str) -> Result<PresignedTarget, ApiError> {
        self.get_json(&format!(
            "/s3/presign?key={}&contentType={}",
            urlencoding::encode(key),
            urlencoding::encode(content_type)
        ))
        .await
    }

    // --- Private ---

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    async fn bearer(&self) -> Option<String> {
        match self.session.fetch_session().await {
            Ok(tokens) => tokens.bearer().map(str::to_owned),
            Err(e) => {
                warn!(error = %e, "session unavailable, sending request unauthenticated");
                None
            }
        }
    }
}

async fn read_response(resp: reqwest::Response) -> Result<Option<Payload>, ApiError> {
    let status = resp.status();

    if matches!(
        status,
        StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
    ) {
        return Ok(None);
    }

    let is_json = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));

    let text = resp.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(status, &text),
        });
    }

    if text.trim().is_empty() {
        return Ok(None);
    }
    if is_json {
        return Ok(Some(Payload::Json(serde_json::from_str(&text)?)));
    }
    Ok(Some(Payload::Text(text)))
}

/// Best-effort message: JSON `message` (top level or under `error`), else
/// the raw body, else the canonical reason phrase.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(body) {
        let msg = v
            .get("message")
            .or_else(|| v.get("error").and_then(|e| e.get("message")))
            .and_then(Value::as_str);
        if let Some(m) = msg {
            return m.to_owned();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_owned();
    }
    status
        .canonical_reason()
        .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_owned)
}

fn not_found_as_none<T>(result: Result<T, ApiError>) -> Result<Option<T>, ApiError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
