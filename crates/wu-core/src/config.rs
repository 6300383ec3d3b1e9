//! Client configuration.
//!
//! Values come from `WU_*` environment variables with defaults, and a page
//! may override the endpoint URLs with `<meta name="wu-api-base">` and
//! `<meta name="wu-media-base">`. The resulting [`ClientConfig`] is handed
//! to the API client explicitly.

use std::time::Duration;

use wu_client::ApiConfig;

use crate::dom::Document;

/// Meta tag overriding the API base URL.
pub const API_BASE_META: &str = "wu-api-base";
/// Meta tag overriding the media base URL.
pub const MEDIA_BASE_META: &str = "wu-media-base";

const DEFAULT_API_BASE: &str = "http://localhost:3000";

/// Configuration shared by every boot module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend API base URL.
    pub api_base_url: String,
    /// Public base URL for uploaded photos.
    pub media_base_url: Option<String>,
    /// How long page guards wait for the session before giving up.
    pub session_timeout: Duration,
    /// Lifetime of the optimistic user summary.
    pub summary_ttl: Duration,
    /// Bound on partial include passes.
    pub include_max_passes: usize,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_owned(),
            media_base_url: None,
            session_timeout: Duration::from_secs(8),
            summary_ttl: Duration::from_secs(600),
            include_max_passes: crate::partials::DEFAULT_MAX_PASSES,
            log_level: "info".to_owned(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                  | Default                 |
    /// |---------------------------|-------------------------|
    /// | `WU_API_BASE_URL`         | `http://localhost:3000` |
    /// | `WU_MEDIA_BASE_URL`       | unset                   |
    /// | `WU_SESSION_TIMEOUT_SECS` | `8`                     |
    /// | `WU_SUMMARY_TTL_SECS`     | `600`                   |
    /// | `WU_INCLUDE_MAX_PASSES`   | `10`                    |
    /// | `WU_LOG_LEVEL`            | `info`                  |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
        let secs = |key: &str, fallback: Duration| {
            non_empty(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(fallback, Duration::from_secs)
        };

        Self {
            api_base_url: non_empty("WU_API_BASE_URL").unwrap_or(defaults.api_base_url),
            media_base_url: non_empty("WU_MEDIA_BASE_URL"),
            session_timeout: secs("WU_SESSION_TIMEOUT_SECS", defaults.session_timeout),
            summary_ttl: secs("WU_SUMMARY_TTL_SECS", defaults.summary_ttl),
            include_max_passes: non_empty("WU_INCLUDE_MAX_PASSES")
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.include_max_passes),
            log_level: non_empty("WU_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Apply page `<meta>` overrides for the endpoint URLs.
    pub fn apply_meta(&mut self, doc: &Document) {
        if let Some(api) = doc.meta_content(API_BASE_META).map(str::trim).filter(|v| !v.is_empty()) {
            api.clone_into(&mut self.api_base_url);
        }
        if let Some(media) = doc
            .meta_content(MEDIA_BASE_META)
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            self.media_base_url = Some(media.to_owned());
        }
    }

    /// The subset the API client needs.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let config = ApiConfig::new(self.api_base_url.trim_end_matches('/'));
        match &self.media_base_url {
            Some(media) => config.with_media_base_url(media.trim_end_matches('/')),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.session_timeout, Duration::from_secs(8));
        assert_eq!(config.summary_ttl, Duration::from_secs(600));
        assert_eq!(config.include_max_passes, 10);
    }

    #[test]
    fn variables_override_and_bad_values_fall_back() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("WU_API_BASE_URL", "https://api.example.com/prod/"),
            ("WU_MEDIA_BASE_URL", "https://media.example.com"),
            ("WU_SESSION_TIMEOUT_SECS", "3"),
            ("WU_SUMMARY_TTL_SECS", "soon"),
            ("WU_INCLUDE_MAX_PASSES", "0"),
            ("WU_LOG_LEVEL", "  "),
        ]));
        assert_eq!(config.api_base_url, "https://api.example.com/prod/");
        assert_eq!(config.session_timeout, Duration::from_secs(3));
        assert_eq!(config.summary_ttl, Duration::from_secs(600));
        assert_eq!(config.include_max_passes, 10);
        assert_eq!(config.log_level, "info");

        let api = config.api_config();
        assert_eq!(api.base_url, "https://api.example.com/prod");
        assert_eq!(api.media_base_url.as_deref(), Some("https://media.example.com"));
    }

    #[test]
    fn meta_tags_override_endpoints() {
        let doc = Document::parse(
            r#"<head><meta name="wu-api-base" content="https://staging.example.com"><meta name="wu-media-base" content=""></head>"#,
        );
        let mut config = ClientConfig::default();
        config.apply_meta(&doc);
        assert_eq!(config.api_base_url, "https://staging.example.com");
        assert_eq!(config.media_base_url, None);
    }
}
