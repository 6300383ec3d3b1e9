//! Page guards and the once-per-session home redirect.
//!
//! Guards are navigation helpers only. They keep signed-out visitors off
//! pages that would render empty; the backend still rejects every call a
//! visitor is not entitled to.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use wu_storage::{StorageError, WebStorage};

use crate::auth::{AuthResolver, AuthState, Role};

/// Where denied visitors are sent.
pub const SAFE_DEFAULT: &str = "/index.html";
/// Session-storage flag set once the home redirect has fired.
pub const REDIRECTED_FLAG: &str = "wu:home-redirected";
/// Default wait for the session before a guard gives up.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(8);

/// Why a guard turned the visitor away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// The session fetch did not settle in time.
    TimedOut,
    /// No signed-in session.
    SignedOut,
    /// Signed in without any of the required roles.
    MissingRole,
}

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The visitor may stay; carries the resolved state.
    Allowed(AuthState),
    /// The visitor must be sent to `to`.
    Redirect { to: String, reason: DenyReason },
}

impl GuardOutcome {
    /// The navigation target when denied.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Allowed(_) => None,
            Self::Redirect { to, .. } => Some(to),
        }
    }
}

/// Requires a signed-in visitor, optionally holding one of a set of roles.
#[derive(Debug, Clone)]
pub struct PageGuard {
    required: Vec<Role>,
    timeout: Duration,
    fallback: String,
}

impl PageGuard {
    /// Any signed-in visitor passes.
    #[must_use]
    pub fn signed_in() -> Self {
        Self::require([])
    }

    /// Signed-in visitors holding at least one of `roles` pass. An empty set
    /// only requires signing in.
    #[must_use]
    pub fn require(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            required: roles.into_iter().collect(),
            timeout: DEFAULT_SESSION_TIMEOUT,
            fallback: SAFE_DEFAULT.to_owned(),
        }
    }

    /// Override the session timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override where denied visitors go.
    #[must_use]
    pub fn with_fallback(mut self, to: impl Into<String>) -> Self {
        self.fallback = to.into();
        self
    }

    /// Race the session fetch against the timeout and judge the result.
    pub async fn check(&self, resolver: &AuthResolver) -> GuardOutcome {
        let state = resolver.get_auth_state_within(self.timeout).await;
        self.evaluate(state)
    }

    /// Judge an already-resolved state. `None` means the fetch timed out.
    #[must_use]
    pub fn evaluate(&self, state: Option<AuthState>) -> GuardOutcome {
        let reason = match &state {
            None => Some(DenyReason::TimedOut),
            Some(s) if !s.signed_in() => Some(DenyReason::SignedOut),
            Some(s) if !self.required.is_empty() && !self.required.iter().any(|&r| s.has_role(r)) => {
                Some(DenyReason::MissingRole)
            }
            Some(_) => None,
        };

        match (reason, state) {
            (None, Some(state)) => GuardOutcome::Allowed(state),
            (reason, _) => {
                let reason = reason.unwrap_or(DenyReason::TimedOut);
                warn!(?reason, to = %self.fallback, "page guard denied access");
                GuardOutcome::Redirect {
                    to: self.fallback.clone(),
                    reason,
                }
            }
        }
    }
}

/// Sends single-role visitors from the home page to their landing page, at
/// most once per browser session.
#[derive(Clone)]
pub struct HomeRedirect {
    session: Arc<dyn WebStorage>,
}

impl std::fmt::Debug for HomeRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HomeRedirect").finish_non_exhaustive()
    }
}

impl HomeRedirect {
    /// Redirect guard keeping its flag in `session` storage.
    #[must_use]
    pub fn new(session: Arc<dyn WebStorage>) -> Self {
        Self { session }
    }

    /// Landing page for `state`, ignoring the once-only flag.
    #[must_use]
    pub fn landing_page(state: &AuthState) -> Option<&'static str> {
        match state.role() {
            Some(Role::Promoter) => Some("/dashboard.html"),
            Some(Role::Wrestler) => Some("/tryouts.html"),
            None => None,
        }
    }

    /// Decide whether to redirect now. Returns the target and records the
    /// flag when a redirect fires.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if session storage fails.
    pub async fn check(&self, state: &AuthState) -> Result<Option<&'static str>, StorageError> {
        if self.session.get(REDIRECTED_FLAG).await?.is_some() {
            return Ok(None);
        }
        let Some(target) = Self::landing_page(state) else {
            return Ok(None);
        };
        self.session.set(REDIRECTED_FLAG, "1").await?;
        info!(to = target, "redirecting from home to role landing page");
        Ok(Some(target))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wu_client::{SessionError, SessionProvider, SessionTokens, StaticSession};
    use wu_storage::MemoryStorage;

    use super::*;
    use crate::auth::test_token;

    fn state(claims: &serde_json::Value) -> AuthState {
        AuthState::from_token(&test_token(claims))
    }

    #[test]
    fn signed_out_and_timeout_go_to_safe_default() {
        let guard = PageGuard::signed_in();
        assert_eq!(
            guard.evaluate(Some(AuthState::signed_out())),
            GuardOutcome::Redirect {
                to: SAFE_DEFAULT.to_owned(),
                reason: DenyReason::SignedOut
            }
        );
        assert_eq!(
            guard.evaluate(None).redirect_target(),
            Some(SAFE_DEFAULT)
        );
    }

    #[test]
    fn role_requirement_is_any_of() {
        let promoter = state(&json!({ "sub": "p", "cognito:groups": ["Promoters"] }));
        let wrestler = state(&json!({ "sub": "w", "custom:role": "wrestler" }));

        let guard = PageGuard::require([Role::Promoter]);
        assert!(matches!(guard.evaluate(Some(promoter.clone())), GuardOutcome::Allowed(_)));
        assert!(matches!(
            guard.evaluate(Some(wrestler.clone())),
            GuardOutcome::Redirect { reason: DenyReason::MissingRole, .. }
        ));

        let either = PageGuard::require(Role::ALL);
        assert!(matches!(either.evaluate(Some(wrestler)), GuardOutcome::Allowed(_)));
    }

    #[tokio::test]
    async fn hung_session_is_treated_as_failure() {
        struct Hung;

        #[async_trait::async_trait]
        impl SessionProvider for Hung {
            async fn fetch_session(&self) -> Result<SessionTokens, SessionError> {
                futures::future::pending().await
            }
        }

        let guard = PageGuard::signed_in().with_timeout(Duration::from_millis(10));
        let outcome = guard.check(&AuthResolver::new(Arc::new(Hung))).await;
        assert_eq!(
            outcome,
            GuardOutcome::Redirect {
                to: SAFE_DEFAULT.to_owned(),
                reason: DenyReason::TimedOut
            }
        );
    }

    #[tokio::test]
    async fn check_allows_signed_in_session() {
        let token = test_token(&json!({ "sub": "u" }));
        let resolver = AuthResolver::new(Arc::new(StaticSession::from_id_token(Some(token))));
        let outcome = PageGuard::signed_in().check(&resolver).await;
        assert!(matches!(outcome, GuardOutcome::Allowed(s) if s.subject_id() == Some("u")));
    }

    #[tokio::test]
    async fn home_redirect_fires_once_per_session() {
        let session = Arc::new(MemoryStorage::new());
        let redirect = HomeRedirect::new(session.clone());
        let promoter = state(&json!({ "cognito:groups": ["Promoters"] }));

        assert_eq!(redirect.check(&promoter).await.unwrap(), Some("/dashboard.html"));
        assert_eq!(redirect.check(&promoter).await.unwrap(), None);

        // A new browser session starts without the flag.
        let fresh = HomeRedirect::new(Arc::new(MemoryStorage::new()));
        let wrestler = state(&json!({ "cognito:groups": ["Wrestlers"] }));
        assert_eq!(fresh.check(&wrestler).await.unwrap(), Some("/tryouts.html"));
    }

    #[tokio::test]
    async fn no_redirect_without_a_single_role() {
        let session = Arc::new(MemoryStorage::new());
        let redirect = HomeRedirect::new(session.clone());

        assert_eq!(redirect.check(&AuthState::signed_out()).await.unwrap(), None);
        let both = state(&json!({ "cognito:groups": ["Promoters", "Wrestlers"] }));
        assert_eq!(redirect.check(&both).await.unwrap(), None);
        assert_eq!(session.get(REDIRECTED_FLAG).await.unwrap(), None);
    }
}
