//! Modules every page loads, in dependency order.

use std::sync::Arc;

use tracing::{debug, info, warn};

use wu_client::ApiClient;

use super::{BootContext, Module, ModuleList};
use crate::auth::Role;
use crate::error::BootError;
use crate::gating::apply_role_gated_ui;
use crate::partials::PartialResolver;
use crate::summary::SummaryCache;

/// Attribute marking "my profile" links.
pub const MY_PROFILE_ATTR: &str = "data-myprofile";

/// The shared list: config, API client, optimistic paint, partials,
/// authoritative auth, profile links.
#[must_use]
pub fn modules() -> ModuleList {
    vec![
        Box::new(Config),
        Box::new(ApiClientModule),
        Box::new(OptimisticAuth),
        Box::new(Partials),
        Box::new(Auth),
        Box::new(ProfileLinks),
    ]
}

/// Applies page `<meta>` overrides to the configuration.
#[derive(Debug, Clone, Copy)]
pub struct Config;

#[async_trait::async_trait]
impl Module for Config {
    fn name(&self) -> &'static str {
        "config"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        ctx.config.apply_meta(&ctx.document);
        if ctx.config.api_base_url.trim().is_empty() {
            return Err(BootError::Config("api base url is empty".to_owned()));
        }
        debug!(api = %ctx.config.api_base_url, media = ?ctx.config.media_base_url, "config loaded");
        Ok(())
    }
}

/// Builds the API client from the configuration.
#[derive(Debug, Clone, Copy)]
pub struct ApiClientModule;

#[async_trait::async_trait]
impl Module for ApiClientModule {
    fn name(&self) -> &'static str {
        "api-client"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let api = ApiClient::new(ctx.config.api_config(), Arc::clone(&ctx.session))?;
        ctx.api = Some(Arc::new(api));
        Ok(())
    }
}

/// Paints gated UI from the cached user summary before the session arrives.
#[derive(Debug, Clone, Copy)]
pub struct OptimisticAuth;

#[async_trait::async_trait]
impl Module for OptimisticAuth {
    fn name(&self) -> &'static str {
        "optimistic-auth"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let cache = SummaryCache::new(Arc::clone(&ctx.storage.local), ctx.config.summary_ttl);
        if let Some(state) = cache.optimistic_state().await? {
            debug!(subject = state.subject_id(), "painting from cached user summary");
            apply_role_gated_ui(&mut ctx.document, &state);
            ctx.optimistic = Some(state);
        }
        Ok(())
    }
}

/// Resolves `data-include` placeholders.
#[derive(Debug, Clone, Copy)]
pub struct Partials;

#[async_trait::async_trait]
impl Module for Partials {
    fn name(&self) -> &'static str {
        "partials"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let resolver = PartialResolver::new(Arc::clone(&ctx.fragments))
            .with_max_passes(ctx.config.include_max_passes);
        let report = resolver.resolve(&mut ctx.document).await;
        if report.passes > 0 {
            info!(
                passes = report.passes,
                resolved = report.resolved,
                failed = report.failed,
                "partials resolved"
            );
        }
        ctx.partials = Some(report);
        Ok(())
    }
}

/// Resolves the authoritative auth state, gates the page, and reconciles
/// the summary cache.
#[derive(Debug, Clone, Copy)]
pub struct Auth;

#[async_trait::async_trait]
impl Module for Auth {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let state = ctx.resolver().get_auth_state().await;
        apply_role_gated_ui(&mut ctx.document, &state);
        ctx.auth = Some(state.clone());

        let cache = SummaryCache::new(Arc::clone(&ctx.storage.local), ctx.config.summary_ttl);
        if cache.reconcile(&state).await? {
            debug!("auth changed since last page load");
        }
        Ok(())
    }
}

/// Points `data-myprofile` links at the user's own profile page.
#[derive(Debug, Clone, Copy)]
pub struct ProfileLinks;

impl ProfileLinks {
    /// Link target for the current state.
    fn target(ctx: &BootContext) -> &'static str {
        let state = ctx.auth_state();
        if !state.signed_in() {
            return "/login.html";
        }
        match state.role() {
            Some(Role::Promoter) => "/profile_promoter.html",
            Some(Role::Wrestler) => "/profile_wrestler.html",
            // No role, or both: there is no single profile to link to.
            None => "/index.html",
        }
    }
}

#[async_trait::async_trait]
impl Module for ProfileLinks {
    fn name(&self) -> &'static str {
        "profile-links"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let links = ctx.document.elements_with_attr(MY_PROFILE_ATTR);
        if links.is_empty() {
            return Ok(());
        }
        let target = Self::target(ctx);
        for link in links {
            if ctx.document.tag(link) != Some("a") {
                warn!(tag = ?ctx.document.tag(link), "data-myprofile on a non-link element");
            }
            ctx.document.set_attr(link, "href", target);
        }
        Ok(())
    }
}
