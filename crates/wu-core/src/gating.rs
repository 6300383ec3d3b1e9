//! Role-gated visibility.
//!
//! Markup contract:
//!
//! - `data-auth="in"`: visible only when signed in
//! - `data-auth="out"`: visible only when signed out
//! - `data-requires="promoter,wrestler"`: visible only when signed in with
//!   one of the listed roles (names are prefix-matched like role claims, so
//!   `Promoters` works too)
//!
//! The document root additionally receives `data-signed-in` and `data-role`
//! so stylesheets can key off the state. Applying the same state twice is a
//! no-op. Elements inserted after a pass are not gated until the next one.

use tracing::debug;

use crate::auth::{AuthResolver, AuthState, Role};
use crate::dom::Document;

/// Root attribute reflecting sign-in state (`"true"` / `"false"`).
pub const SIGNED_IN_ATTR: &str = "data-signed-in";
/// Root attribute listing held roles, space-separated.
pub const ROLE_ATTR: &str = "data-role";

/// What a gating pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GatingReport {
    /// Marked elements left visible.
    pub shown: usize,
    /// Marked elements hidden.
    pub hidden: usize,
}

/// Apply `state` to every marked element in `doc`.
pub fn apply_role_gated_ui(doc: &mut Document, state: &AuthState) -> GatingReport {
    if let Some(root) = doc.document_element() {
        doc.set_attr(root, SIGNED_IN_ATTR, if state.signed_in() { "true" } else { "false" });
        let roles = state
            .roles()
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        doc.set_attr(root, ROLE_ATTR, &roles);
    }

    let mut report = GatingReport::default();
    let marked: Vec<_> = doc
        .descendants(doc.root())
        .into_iter()
        .filter(|&id| doc.has_attr(id, "data-auth") || doc.has_attr(id, "data-requires"))
        .collect();

    for id in marked {
        let auth_ok = match doc.attr(id, "data-auth").map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("in") => state.signed_in(),
            Some(v) if v.eq_ignore_ascii_case("out") => !state.signed_in(),
            Some(other) => {
                debug!(value = other, "ignoring unknown data-auth value");
                true
            }
            None => true,
        };
        let role_ok = doc
            .attr(id, "data-requires")
            .is_none_or(|list| requirement_met(list, state));

        let visible = auth_ok && role_ok;
        doc.set_hidden(id, !visible);
        if visible {
            report.shown += 1;
        } else {
            report.hidden += 1;
        }
    }

    debug!(shown = report.shown, hidden = report.hidden, "role gating applied");
    report
}

/// Whether `state` satisfies a `data-requires` role list.
fn requirement_met(list: &str, state: &AuthState) -> bool {
    state.signed_in()
        && list
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter_map(Role::from_claim)
            .any(|r| state.has_role(r))
}

/// Resolve-then-apply convenience over an [`AuthResolver`].
#[derive(Debug, Clone)]
pub struct RoleGate {
    resolver: AuthResolver,
}

impl RoleGate {
    /// Gate driven by `resolver`.
    #[must_use]
    pub fn new(resolver: AuthResolver) -> Self {
        Self { resolver }
    }

    /// Resolve the current auth state, apply it, and return it.
    pub async fn apply(&self, doc: &mut Document) -> AuthState {
        let state = self.resolver.get_auth_state().await;
        apply_role_gated_ui(doc, &state);
        state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wu_client::StaticSession;

    use super::*;
    use crate::auth::test_token;

    const PAGE: &str = r#"<html><body>
<a id="login" data-auth="out" href="/login.html">Log in</a>
<a id="logout" data-auth="in" href="/logout">Log out</a>
<section id="promo" data-requires="promoter">Post a tryout</section>
<section id="either" data-requires="Promoters, wrestler">Messages</section>
<section id="wrestler-only" data-auth="in" data-requires="wrestler">Apply</section>
<p id="plain">Always</p>
</body></html>"#;

    fn visible(doc: &Document, id: &str) -> bool {
        !doc.is_hidden(doc.get_element_by_id(id).unwrap())
    }

    fn promoter() -> AuthState {
        AuthState::from_token(&test_token(&json!({ "sub": "p1", "cognito:groups": ["Promoters"] })))
    }

    #[test]
    fn signed_out_shows_only_signed_out_markers() {
        let mut doc = Document::parse(PAGE);
        let report = apply_role_gated_ui(&mut doc, &AuthState::signed_out());

        assert!(visible(&doc, "login"));
        assert!(!visible(&doc, "logout"));
        assert!(!visible(&doc, "promo"));
        assert!(!visible(&doc, "either"));
        assert!(!visible(&doc, "wrestler-only"));
        assert!(visible(&doc, "plain"));
        assert_eq!(report, GatingReport { shown: 1, hidden: 4 });

        let root = doc.document_element().unwrap();
        assert_eq!(doc.attr(root, SIGNED_IN_ATTR), Some("false"));
        assert_eq!(doc.attr(root, ROLE_ATTR), Some(""));
    }

    #[test]
    fn promoter_sees_promoter_sections() {
        let mut doc = Document::parse(PAGE);
        apply_role_gated_ui(&mut doc, &promoter());

        assert!(!visible(&doc, "login"));
        assert!(visible(&doc, "logout"));
        assert!(visible(&doc, "promo"));
        assert!(visible(&doc, "either"));
        assert!(!visible(&doc, "wrestler-only"));

        let root = doc.document_element().unwrap();
        assert_eq!(doc.attr(root, SIGNED_IN_ATTR), Some("true"));
        assert_eq!(doc.attr(root, ROLE_ATTR), Some("promoter"));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let state = promoter();
        let mut once = Document::parse(PAGE);
        apply_role_gated_ui(&mut once, &state);

        let mut twice = Document::parse(PAGE);
        apply_role_gated_ui(&mut twice, &state);
        let second = apply_role_gated_ui(&mut twice, &state);

        assert_eq!(once.to_html(), twice.to_html());
        assert_eq!(second, GatingReport { shown: 3, hidden: 2 });
    }

    #[test]
    fn state_change_unhides_previously_hidden() {
        let mut doc = Document::parse(PAGE);
        apply_role_gated_ui(&mut doc, &promoter());
        assert!(!visible(&doc, "login"));
        apply_role_gated_ui(&mut doc, &AuthState::signed_out());
        assert!(visible(&doc, "login"));
        assert!(!visible(&doc, "promo"));
    }

    #[test]
    fn late_elements_need_a_second_pass() {
        let mut doc = Document::parse(PAGE);
        let state = promoter();
        apply_role_gated_ui(&mut doc, &state);

        let body = doc.body().unwrap();
        let late = doc.parse_fragment(r#"<div id="late" data-auth="out">Sign up</div>"#);
        doc.append_child(body, late[0]);
        assert!(visible(&doc, "late"));

        apply_role_gated_ui(&mut doc, &state);
        assert!(!visible(&doc, "late"));
    }

    #[tokio::test]
    async fn role_gate_resolves_and_returns_state() {
        let token = test_token(&json!({ "sub": "w1", "custom:role": "wrestler" }));
        let gate = RoleGate::new(AuthResolver::new(Arc::new(StaticSession::from_id_token(Some(
            token,
        )))));
        let mut doc = Document::parse(PAGE);
        let state = gate.apply(&mut doc).await;

        assert_eq!(state.role(), Some(Role::Wrestler));
        assert!(visible(&doc, "wrestler-only"));
        assert!(!visible(&doc, "promo"));
    }
}
