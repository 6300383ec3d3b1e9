//! The identity-provider seam.
//!
//! The client layer consumes exactly one operation from the identity
//! provider: "fetch the current session". Everything else (sign-in, refresh,
//! sign-out) belongs to the provider's own SDK and stays outside this crate.

use crate::error::SessionError;

/// Tokens returned by the identity provider for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionTokens {
    /// Signed ID token carrying `sub`, `cognito:groups` and custom claims.
    pub id_token: Option<String>,
    /// Access token, used as bearer only when no ID token is present.
    pub access_token: Option<String>,
}

impl SessionTokens {
    /// Session with only an ID token.
    #[must_use]
    pub fn with_id_token(token: impl Into<String>) -> Self {
        Self {
            id_token: Some(token.into()),
            access_token: None,
        }
    }

    /// The token to send as `Authorization: Bearer`, if any.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.id_token
            .as_deref()
            .or(self.access_token.as_deref())
            .filter(|t| !t.is_empty())
    }
}

/// Source of the current session.
///
/// Implementations must be cheap to call repeatedly; the resolver asks for
/// the session on every auth query instead of caching it.
#[async_trait::async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    /// Fetch the current session. A signed-out user is `Ok` with no tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the provider cannot produce a session.
    async fn fetch_session(&self) -> Result<SessionTokens, SessionError>;
}

/// A provider with a fixed session, e.g. a token passed on the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    tokens: SessionTokens,
}

impl StaticSession {
    /// A provider that always returns `tokens`.
    #[must_use]
    pub fn new(tokens: SessionTokens) -> Self {
        Self { tokens }
    }

    /// A provider for a signed-in user holding `id_token`, or a signed-out
    /// one when `None`.
    #[must_use]
    pub fn from_id_token(id_token: Option<String>) -> Self {
        Self::new(SessionTokens {
            id_token,
            access_token: None,
        })
    }

    /// A provider that always reports a signed-out session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionProvider for StaticSession {
    async fn fetch_session(&self) -> Result<SessionTokens, SessionError> {
        Ok(self.tokens.clone())
    }
}
