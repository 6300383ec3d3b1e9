//! Partial includes.
//!
//! A placeholder is any element carrying `data-include="<url>"`. Each pass
//! fetches every placeholder currently in the document concurrently, splices
//! the parsed fragment in place of its placeholder, and re-arms the
//! fragment's scripts. Fragments may contain further placeholders, so passes
//! repeat until none are left or the pass limit is reached.
//!
//! A failed fetch is logged and its placeholder stays in the document
//! unresolved: `data-include` is swapped for `data-include-failed` so later
//! passes skip it. Failures never affect sibling placeholders.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, warn};
use url::Url;

use crate::dom::Document;
use crate::error::FragmentError;

/// Attribute marking a placeholder.
pub const INCLUDE_ATTR: &str = "data-include";
/// Attribute left on a placeholder whose fetch failed.
pub const FAILED_ATTR: &str = "data-include-failed";
/// Default bound on resolution passes.
pub const DEFAULT_MAX_PASSES: usize = 10;

/// Somewhere partial HTML can be fetched from.
#[async_trait::async_trait]
pub trait FragmentSource: Send + Sync + 'static {
    /// Fetch the HTML text behind `url`.
    ///
    /// # Errors
    ///
    /// Returns a [`FragmentError`] when the fragment cannot be produced.
    async fn fetch(&self, url: &str) -> Result<String, FragmentError>;
}

/// Fragments fetched over HTTP, relative URLs joined to a base URL.
#[derive(Debug, Clone)]
pub struct HttpFragmentSource {
    http: reqwest::Client,
    base: Url,
}

impl HttpFragmentSource {
    /// Source resolving include URLs against `base` the way a page at that
    /// address would: absolute, protocol-relative, root-relative and
    /// document-relative references all follow URL joining rules.
    ///
    /// # Errors
    ///
    /// [`FragmentError::InvalidUrl`] when `base` is not an absolute URL.
    pub fn new(base: &str) -> Result<Self, FragmentError> {
        let base = Url::parse(base).map_err(|_| FragmentError::InvalidUrl {
            url: base.to_owned(),
        })?;
        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    fn absolute(&self, url: &str) -> Result<Url, FragmentError> {
        self.base.join(url).map_err(|_| FragmentError::InvalidUrl {
            url: url.to_owned(),
        })
    }
}

#[async_trait::async_trait]
impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, url: &str) -> Result<String, FragmentError> {
        let target = self.absolute(url)?;
        let fetch_err = |e: reqwest::Error| FragmentError::Fetch {
            url: url.to_owned(),
            reason: e.to_string(),
        };
        let resp = self.http.get(target).send().await.map_err(fetch_err)?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FragmentError::NotFound {
                url: url.to_owned(),
            });
        }
        if !status.is_success() {
            return Err(FragmentError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }
        resp.text().await.map_err(fetch_err)
    }
}

/// Fragments read from files under a site root directory.
#[derive(Debug, Clone)]
pub struct DirFragmentSource {
    root: PathBuf,
}

impl DirFragmentSource {
    /// Source serving files below `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a site URL to a file below the root, refusing to escape it.
    fn path_for(&self, url: &str) -> Result<PathBuf, FragmentError> {
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_start_matches('/');
        let decoded = urlencoding::decode(path).map_err(|_| FragmentError::InvalidUrl {
            url: url.to_owned(),
        })?;
        let relative = Path::new(decoded.as_ref());
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || decoded.is_empty() {
            return Err(FragmentError::InvalidUrl {
                url: url.to_owned(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl FragmentSource for DirFragmentSource {
    async fn fetch(&self, url: &str) -> Result<String, FragmentError> {
        let path = self.path_for(url)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FragmentError::NotFound {
                url: url.to_owned(),
            }),
            Err(e) => Err(FragmentError::Fetch {
                url: url.to_owned(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Fixed in-memory fragments, keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct MemoryFragmentSource {
    fragments: HashMap<String, String>,
}

impl MemoryFragmentSource {
    /// Empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment.
    #[must_use]
    pub fn with(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.fragments.insert(url.into(), html.into());
        self
    }
}

#[async_trait::async_trait]
impl FragmentSource for MemoryFragmentSource {
    async fn fetch(&self, url: &str) -> Result<String, FragmentError> {
        self.fragments
            .get(url)
            .cloned()
            .ok_or_else(|| FragmentError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Outcome of a resolution run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartialReport {
    /// Passes that found at least one placeholder.
    pub passes: usize,
    /// Placeholders replaced with their fragment.
    pub resolved: usize,
    /// Placeholders left unresolved because their fetch failed.
    pub failed: usize,
    /// Placeholders remained when the pass limit was hit.
    pub exhausted: bool,
}

/// Resolves `data-include` placeholders in a document.
#[derive(Clone)]
pub struct PartialResolver {
    source: Arc<dyn FragmentSource>,
    max_passes: usize,
}

impl std::fmt::Debug for PartialResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialResolver")
            .field("max_passes", &self.max_passes)
            .finish_non_exhaustive()
    }
}

impl PartialResolver {
    /// Resolver over `source` with the default pass limit.
    #[must_use]
    pub fn new(source: Arc<dyn FragmentSource>) -> Self {
        Self {
            source,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Override the pass limit (minimum 1).
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }

    /// Resolve every placeholder in `doc`, nested ones included.
    pub async fn resolve(&self, doc: &mut Document) -> PartialReport {
        let mut report = PartialReport::default();

        for pass in 1..=self.max_passes {
            let placeholders: Vec<_> = doc
                .elements_with_attr(INCLUDE_ATTR)
                .into_iter()
                .map(|id| {
                    let url = doc.attr(id, INCLUDE_ATTR).unwrap_or_default().trim().to_owned();
                    (id, url)
                })
                .collect();
            if placeholders.is_empty() {
                return report;
            }
            report.passes = pass;
            debug!(pass, count = placeholders.len(), "resolving partials");

            let fetches = placeholders.iter().map(|(_, url)| {
                let source = Arc::clone(&self.source);
                async move {
                    if url.is_empty() {
                        return Err(FragmentError::EmptySource);
                    }
                    source.fetch(url).await
                }
            });
            let results = join_all(fetches).await;

            for ((placeholder, url), result) in placeholders.into_iter().zip(results) {
                match result {
                    Ok(html) => {
                        splice(doc, placeholder, &html);
                        report.resolved += 1;
                    }
                    Err(e) => {
                        error!(url = %url, error = %e, "partial include failed");
                        doc.remove_attr(placeholder, INCLUDE_ATTR);
                        doc.set_attr(placeholder, FAILED_ATTR, &url);
                        report.failed += 1;
                    }
                }
            }
        }

        let remaining = doc.elements_with_attr(INCLUDE_ATTR).len();
        if remaining > 0 {
            warn!(
                max_passes = self.max_passes,
                remaining, "partial nesting exceeded pass limit, giving up"
            );
            report.exhausted = true;
        }
        report
    }
}

/// Replace `placeholder` with the parsed `html` and re-arm its scripts.
fn splice(doc: &mut Document, placeholder: crate::dom::NodeId, html: &str) {
    let nodes = doc.parse_fragment(html);
    doc.replace_with(placeholder, &nodes);
    for node in nodes {
        for script in doc.inert_scripts(node) {
            doc.recreate_script(script);
        }
    }
}
