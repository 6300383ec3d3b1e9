//! Page controllers and the page → module table.
//!
//! Controllers fetch through the API client and render into elements found
//! by id. A missing container means the page does not show that section and
//! is skipped. API failures stop at the controller: the container shows a
//! "Could not load …" message and boot carries on.

mod dashboard;
mod home;
mod profile;
mod talent;
mod tryouts;

use std::fmt;

use tracing::{debug, warn};

use crate::auth::Role;
use crate::boot::{BootContext, Module, ModuleList, PageKind};
use crate::dom::{Document, NodeId, escape_html};
use crate::error::BootError;
use crate::guard::{GuardOutcome, HomeRedirect, PageGuard};

pub use dashboard::Dashboard;
pub use home::Home;
pub use profile::{
    MyPromoterProfile, MyWrestlerProfile, PublicWrestlerProfile, save_promoter_form,
    save_wrestler_form,
};
pub use talent::{Talent, wrestler_card};
pub use tryouts::{TryoutDetail, TryoutList, tryout_card};

/// Module list for each page kind.
#[must_use]
pub fn modules_for(kind: &PageKind) -> ModuleList {
    match kind {
        PageKind::Home => vec![Box::new(HomeRedirectModule), Box::new(Home)],
        PageKind::Tryouts => vec![Box::new(TryoutList)],
        PageKind::TryoutDetail => vec![Box::new(TryoutDetail)],
        PageKind::Talent => vec![Box::new(Talent)],
        PageKind::WrestlerProfile => vec![Box::new(PublicWrestlerProfile)],
        PageKind::MyWrestlerProfile => vec![
            Box::new(RequireAuth::roles(&[Role::Wrestler])),
            Box::new(MyWrestlerProfile),
        ],
        PageKind::MyPromoterProfile => vec![
            Box::new(RequireAuth::roles(&[Role::Promoter])),
            Box::new(MyPromoterProfile),
        ],
        PageKind::Dashboard => vec![
            Box::new(RequireAuth::roles(&[Role::Promoter])),
            Box::new(Dashboard),
        ],
        PageKind::Login | PageKind::Other(_) => Vec::new(),
    }
}

/// Sends visitors without the required session away from the page.
#[derive(Debug, Clone)]
pub struct RequireAuth {
    roles: Vec<Role>,
}

impl RequireAuth {
    /// Require a session holding one of `roles` (any session when empty).
    #[must_use]
    pub fn roles(roles: &[Role]) -> Self {
        Self {
            roles: roles.to_vec(),
        }
    }
}

#[async_trait::async_trait]
impl Module for RequireAuth {
    fn name(&self) -> &'static str {
        "require-auth"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let guard = PageGuard::require(self.roles.iter().copied())
            .with_timeout(ctx.config.session_timeout);
        match guard.check(&ctx.resolver()).await {
            GuardOutcome::Allowed(state) => ctx.auth = Some(state),
            GuardOutcome::Redirect { to, .. } => ctx.navigate(to),
        }
        Ok(())
    }
}

/// Once-per-session redirect from the home page to the role landing page.
#[derive(Debug, Clone, Copy)]
pub struct HomeRedirectModule;

#[async_trait::async_trait]
impl Module for HomeRedirectModule {
    fn name(&self) -> &'static str {
        "home-redirect"
    }

    async fn init(&self, ctx: &mut BootContext) -> Result<(), BootError> {
        let state = ctx.auth_state();
        let redirect = HomeRedirect::new(std::sync::Arc::clone(&ctx.storage.session));
        if let Some(to) = redirect.check(&state).await? {
            ctx.navigate(to);
        }
        Ok(())
    }
}

/// Replace the contents of `#id` with `html`. Returns `false` when the
/// page has no such element.
pub(crate) fn render_into(doc: &mut Document, id: &str, html: &str) -> bool {
    let Some(container) = doc.get_element_by_id(id) else {
        debug!(id, "container not on page, skipping");
        return false;
    };
    fill(doc, container, html);
    true
}

/// Replace the children of `container` with parsed `html`.
pub(crate) fn fill(doc: &mut Document, container: NodeId, html: &str) {
    doc.clear_children(container);
    for node in doc.parse_fragment(html) {
        doc.append_child(container, node);
    }
}

/// Show an inline load failure in `#id`.
pub(crate) fn render_error(doc: &mut Document, id: &str, what: &str, err: &dyn fmt::Display) {
    warn!(container = id, error = %err, "could not load {}", what);
    render_into(
        doc,
        id,
        &format!(
            r#"<p class="error">Could not load {}. {}</p>"#,
            escape_html(what),
            escape_html(&err.to_string())
        ),
    );
}

/// Markup for an empty list.
pub(crate) fn empty_state(message: &str) -> String {
    format!(r#"<p class="empty">{}</p>"#, escape_html(message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! Shared fixtures for controller tests.

    use std::sync::Arc;

    use wiremock::MockServer;
    use wu_client::StaticSession;
    use wu_storage::BrowserStorage;

    use crate::auth::test_token;
    use crate::boot::{BootContext, Module};
    use crate::config::ClientConfig;
    use crate::dom::Document;
    use crate::partials::MemoryFragmentSource;

    /// A context wired to `server`, with the API client already built.
    pub(crate) async fn context(
        server: &MockServer,
        html: &str,
        url: &str,
        claims: Option<serde_json::Value>,
    ) -> BootContext {
        let token = claims.map(|c| test_token(&c));
        let config = ClientConfig {
            api_base_url: server.uri(),
            media_base_url: Some("https://media.example.com".to_owned()),
            ..ClientConfig::default()
        };
        let mut ctx = BootContext::new(
            Document::parse(html),
            url,
            config,
            BrowserStorage::in_memory(),
            Arc::new(StaticSession::from_id_token(token)),
            Arc::new(MemoryFragmentSource::new()),
        );
        crate::boot::shared::ApiClientModule.init(&mut ctx).await.unwrap();
        ctx
    }

    /// Text of `#id`.
    pub(crate) fn text(ctx: &BootContext, id: &str) -> String {
        let node = ctx.document.get_element_by_id(id).unwrap();
        ctx.document.text_content(node)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::MockServer;
    use wu_storage::WebStorage;

    use super::testing::context;
    use super::*;
    use crate::guard::{REDIRECTED_FLAG, SAFE_DEFAULT};

    #[test]
    fn every_known_page_has_modules() {
        for kind in [
            PageKind::Home,
            PageKind::Tryouts,
            PageKind::TryoutDetail,
            PageKind::Talent,
            PageKind::WrestlerProfile,
            PageKind::MyWrestlerProfile,
            PageKind::MyPromoterProfile,
            PageKind::Dashboard,
        ] {
            assert!(!modules_for(&kind).is_empty(), "{kind}");
        }
        assert!(modules_for(&PageKind::Other("about".to_owned())).is_empty());
    }

    #[tokio::test]
    async fn require_auth_redirects_wrong_role() {
        let server = MockServer::start().await;
        let mut ctx = context(
            &server,
            "<body></body>",
            "/dashboard.html",
            Some(json!({ "sub": "w", "cognito:groups": ["Wrestlers"] })),
        )
        .await;

        RequireAuth::roles(&[Role::Promoter]).init(&mut ctx).await.unwrap();
        assert_eq!(ctx.navigation.as_deref(), Some(SAFE_DEFAULT));
    }

    #[tokio::test]
    async fn require_auth_records_state_when_allowed() {
        let server = MockServer::start().await;
        let mut ctx = context(
            &server,
            "<body></body>",
            "/dashboard.html",
            Some(json!({ "sub": "p", "custom:role": "promoter" })),
        )
        .await;

        RequireAuth::roles(&[Role::Promoter]).init(&mut ctx).await.unwrap();
        assert_eq!(ctx.navigation, None);
        assert!(ctx.auth.as_ref().is_some_and(|s| s.is_promoter()));
    }

    #[tokio::test]
    async fn home_redirect_module_fires_once() {
        let server = MockServer::start().await;
        let claims = json!({ "sub": "p", "cognito:groups": ["Promoters"] });
        let mut ctx = context(&server, "<body></body>", "/", Some(claims)).await;
        ctx.auth = Some(ctx.resolver().get_auth_state().await);

        HomeRedirectModule.init(&mut ctx).await.unwrap();
        assert_eq!(ctx.navigation.as_deref(), Some("/dashboard.html"));
        assert_eq!(
            ctx.storage.session.get(REDIRECTED_FLAG).await.unwrap().as_deref(),
            Some("1")
        );

        ctx.navigation = None;
        HomeRedirectModule.init(&mut ctx).await.unwrap();
        assert_eq!(ctx.navigation, None);
    }

    #[test]
    fn render_error_shows_inline_message() {
        let mut doc = Document::parse(r#"<div id="list"><p>old</p></div>"#);
        let err = wu_client::ApiError::Status {
            status: 500,
            message: "<boom>".to_owned(),
        };
        render_error(&mut doc, "list", "tryouts", &err);
        assert_eq!(
            doc.to_html(),
            r#"<div id="list"><p class="error">Could not load tryouts. API 500: &lt;boom&gt;</p></div>"#
        );
        assert!(!render_into(&mut doc, "absent", "<p></p>"));
    }
}
