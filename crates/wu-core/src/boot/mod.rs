//! Page bootstrap.
//!
//! [`Boot::run`] executes once per page load:
//!
//! 1. the shared modules, in order (`config`, `api-client`,
//!    `optimistic-auth`, `partials`, `auth`, `profile-links`);
//! 2. page identity resolution (see [`PageIdentity`]);
//! 3. the page's own module list, in order.
//!
//! Every module is isolated: an `Err` or a panic is logged, recorded in the
//! [`BootReport`], and the sequence moves on. A module requesting navigation
//! ends the page stage, since the page is being left.

mod page;
pub mod shared;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt as _;
use tracing::{debug, error, info};

use wu_client::{ApiClient, SessionProvider};
use wu_storage::BrowserStorage;

use crate::auth::{AuthResolver, AuthState};
use crate::config::ClientConfig;
use crate::dom::Document;
use crate::error::BootError;
use crate::partials::{FragmentSource, PartialReport};

pub use page::{PAGE_META, PageIdentity, PageKind, PageLocation};

/// One step of the boot sequence.
#[async_trait::async_trait]
pub trait Module: Send + Sync {
    /// Stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Run the module against the page.
    ///
    /// # Errors
    ///
    /// Any [`BootError`]; the loader logs it and continues.
    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError>;
}

/// Ordered module list.
pub type ModuleList = Vec<Box<dyn Module>>;

/// Maps a page kind to its module list.
pub type PageTable = fn(&PageKind) -> ModuleList;

/// Everything a module may read or change.
pub struct BootContext {
    pub document: Document,
    pub location: PageLocation,
    pub config: ClientConfig,
    pub storage: BrowserStorage,
    pub session: Arc<dyn SessionProvider>,
    pub fragments: Arc<dyn FragmentSource>,
    /// Set by the `api-client` module.
    pub api: Option<Arc<ApiClient>>,
    /// Provisional state painted from the summary cache.
    pub optimistic: Option<AuthState>,
    /// Authoritative state, set by the `auth` module.
    pub auth: Option<AuthState>,
    /// Set once shared modules have run.
    pub page: Option<PageIdentity>,
    /// Outcome of partial resolution.
    pub partials: Option<PartialReport>,
    /// Requested navigation target, if any.
    pub navigation: Option<String>,
}

impl std::fmt::Debug for BootContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootContext")
            .field("location", &self.location)
            .field("config", &self.config)
            .field("auth", &self.auth)
            .field("page", &self.page)
            .field("navigation", &self.navigation)
            .finish_non_exhaustive()
    }
}

impl BootContext {
    /// Context for `document` at `url`.
    #[must_use]
    pub fn new(
        document: Document,
        url: &str,
        config: ClientConfig,
        storage: BrowserStorage,
        session: Arc<dyn SessionProvider>,
        fragments: Arc<dyn FragmentSource>,
    ) -> Self {
        Self {
            document,
            location: PageLocation::parse(url),
            config,
            storage,
            session,
            fragments,
            api: None,
            optimistic: None,
            auth: None,
            page: None,
            partials: None,
            navigation: None,
        }
    }

    /// The API client.
    ///
    /// # Errors
    ///
    /// [`BootError::MissingApi`] when the `api-client` module has not run.
    pub fn api(&self) -> Result<Arc<ApiClient>, BootError> {
        self.api.clone().ok_or(BootError::MissingApi)
    }

    /// Resolver over the shared session.
    #[must_use]
    pub fn resolver(&self) -> AuthResolver {
        AuthResolver::new(Arc::clone(&self.session))
    }

    /// The best known auth state: authoritative, else optimistic, else
    /// signed out.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        self.auth
            .clone()
            .or_else(|| self.optimistic.clone())
            .unwrap_or_default()
    }

    /// Request navigation away from the page. The first request wins.
    pub fn navigate(&mut self, to: impl Into<String>) {
        if self.navigation.is_none() {
            let to = to.into();
            info!(to = %to, "navigation requested");
            self.navigation = Some(to);
        }
    }
}

/// What happened during a boot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootReport {
    /// Modules that completed, in order.
    pub loaded: Vec<&'static str>,
    /// Modules that failed or panicked, with the reason.
    pub failed: Vec<(&'static str, String)>,
    /// Resolved page kind.
    pub page: Option<PageKind>,
    /// Navigation requested by a module.
    pub navigation: Option<String>,
}

/// The boot sequence.
pub struct Boot {
    shared: ModuleList,
    pages: PageTable,
}

impl std::fmt::Debug for Boot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.shared.iter().map(|m| m.name()).collect();
        f.debug_struct("Boot").field("shared", &names).finish_non_exhaustive()
    }
}

impl Default for Boot {
    fn default() -> Self {
        Self::new(shared::modules(), crate::pages::modules_for)
    }
}

impl Boot {
    /// A sequence with explicit shared modules and page table.
    #[must_use]
    pub fn new(shared: ModuleList, pages: PageTable) -> Self {
        Self { shared, pages }
    }

    /// Run the whole sequence against `ctx`.
    pub async fn run(&self, ctx: &mut BootContext) -> BootReport {
        let mut report = BootReport::default();

        for module in &self.shared {
            load(module.as_ref(), ctx, &mut report).await;
        }

        let identity = PageIdentity::resolve(ctx.document.meta_content(PAGE_META), &ctx.location);
        info!(page = %identity.kind, param = ?identity.param, "page identified");
        report.page = Some(identity.kind.clone());
        let modules = (self.pages)(&identity.kind);
        ctx.page = Some(identity);

        if modules.is_empty() {
            debug!("no page modules mapped");
        }
        for module in &modules {
            if ctx.navigation.is_some() {
                debug!(module = module.name(), "skipping, page is navigating away");
                break;
            }
            load(module.as_ref(), ctx, &mut report).await;
        }

        report.navigation.clone_from(&ctx.navigation);
        report
    }
}

async fn load(module: &dyn Module, ctx: &mut BootContext, report: &mut BootReport) {
    let name = module.name();
    debug!(module = name, "loading module");
    let outcome = AssertUnwindSafe(module.init(ctx)).catch_unwind().await;
    match outcome {
        Ok(Ok(())) => report.loaded.push(name),
        Ok(Err(e)) => {
            error!(module = name, error = %e, "module failed");
            report.failed.push((name, e.to_string()));
        }
        Err(panic) => {
            let e = BootError::Panicked(panic_message(panic.as_ref()));
            error!(module = name, error = %e, "module panicked");
            report.failed.push((name, e.to_string()));
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
