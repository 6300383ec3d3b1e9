//! Auth state resolution from the identity provider's ID token.
//!
//! The token payload is decoded without verifying its signature. That is
//! acceptable only because nothing here is an authorization boundary: the
//! resulting [`AuthState`] drives what the UI shows, and the backend
//! re-validates the token on every privileged call.
//!
//! Resolution never fails. A missing session, an unreachable provider, or a
//! token that does not decode all produce [`AuthState::signed_out`].

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use wu_client::SessionProvider;

use crate::error::TokenError;

/// Claim holding the user's identity-provider groups.
pub const GROUPS_CLAIM: &str = "cognito:groups";
/// Custom attribute holding the self-declared role.
pub const ROLE_CLAIM: &str = "custom:role";

/// Marketplace role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Promoter,
    Wrestler,
}

impl Role {
    /// All roles, in a stable order.
    pub const ALL: [Self; 2] = [Self::Promoter, Self::Wrestler];

    /// Classify a free-form role string by case-insensitive prefix:
    /// `promo…` is a promoter, `wrestl…` a wrestler.
    #[must_use]
    pub fn from_claim(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.starts_with("promo") {
            Some(Self::Promoter)
        } else if normalized.starts_with("wrestl") {
            Some(Self::Wrestler)
        } else {
            None
        }
    }

    /// Name of the identity-provider group granting this role.
    #[must_use]
    pub fn group_name(self) -> &'static str {
        match self {
            Self::Promoter => "Promoters",
            Self::Wrestler => "Wrestlers",
        }
    }

    /// Lowercase identifier used in markup attributes.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Promoter => "promoter",
            Self::Wrestler => "wrestler",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who the current user is, as far as the UI is concerned.
///
/// Role checks are independent: a token carrying both the promoter and the
/// wrestler markers answers `true` to both, and [`role`](Self::role) is then
/// `None` because no precedence between them is defined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    signed_in: bool,
    groups: BTreeSet<String>,
    custom_role: Option<String>,
    subject_id: Option<String>,
    display_name: Option<String>,
}

impl AuthState {
    /// The signed-out default.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Build a state from decoded token claims.
    #[must_use]
    pub fn from_claims(claims: &Map<String, Value>) -> Self {
        let groups = claims.get(GROUPS_CLAIM).map(parse_groups).unwrap_or_default();

        let custom_role = claims
            .get(ROLE_CLAIM)
            .or_else(|| claims.get("role"))
            .and_then(Value::as_str)
            .map(|r| r.trim().to_ascii_lowercase())
            .filter(|r| !r.is_empty());

        let subject_id = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        let display_name = ["name", "preferred_username", "email"]
            .iter()
            .find_map(|k| claims.get(*k).and_then(Value::as_str))
            .filter(|s| !s.is_empty())
            .map(str::to_owned);

        Self {
            signed_in: true,
            groups,
            custom_role,
            subject_id,
            display_name,
        }
    }

    /// Decode `token` and build a state; any failure yields signed-out.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match decode_claims(token) {
            Ok(claims) => Self::from_claims(&claims),
            Err(e) => {
                debug!(error = %e, "identity token did not decode, treating as signed out");
                Self::signed_out()
            }
        }
    }

    /// A provisional signed-in state for instant paint before the
    /// authoritative session arrives.
    #[must_use]
    pub fn optimistic(subject_id: Option<String>, role: Option<Role>, display_name: Option<String>) -> Self {
        Self {
            signed_in: true,
            groups: role.map(|r| r.group_name().to_owned()).into_iter().collect(),
            custom_role: None,
            subject_id,
            display_name,
        }
    }

    /// Whether a session with a readable token exists.
    #[must_use]
    pub fn signed_in(&self) -> bool {
        self.signed_in
    }

    /// Identity-provider groups.
    #[must_use]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    /// Subject (`sub`) claim.
    #[must_use]
    pub fn subject_id(&self) -> Option<&str> {
        self.subject_id.as_deref()
    }

    /// Name to greet the user with, from `name`, `preferred_username` or `email`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Whether the user holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        if !self.signed_in {
            return false;
        }
        let in_group = self
            .groups
            .iter()
            .any(|g| g.eq_ignore_ascii_case(role.group_name()));
        let claimed = self
            .custom_role
            .as_deref()
            .and_then(Role::from_claim)
            .is_some_and(|r| r == role);
        in_group || claimed
    }

    /// Whether the user is a promoter.
    #[must_use]
    pub fn is_promoter(&self) -> bool {
        self.has_role(Role::Promoter)
    }

    /// Whether the user is a wrestler.
    #[must_use]
    pub fn is_wrestler(&self) -> bool {
        self.has_role(Role::Wrestler)
    }

    /// Every role the user holds.
    #[must_use]
    pub fn roles(&self) -> Vec<Role> {
        Role::ALL.into_iter().filter(|&r| self.has_role(r)).collect()
    }

    /// The user's role when exactly one holds.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        match self.roles().as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

/// Decode the payload segment of a JWT without checking its signature.
///
/// # Errors
///
/// Returns a [`TokenError`] describing which step failed.
pub fn decode_claims(token: &str) -> Result<Map<String, Value>, TokenError> {
    let parts: Vec<&str> = token.trim().split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::Malformed {
            segments: parts.len(),
        });
    }

    let bytes = base64_decode_lenient(parts[1])?;
    match serde_json::from_slice::<Value>(&bytes)? {
        Value::Object(map) => Ok(map),
        _ => Err(TokenError::NotObject),
    }
}

/// base64url, padded or not, falling back to the standard alphabet.
fn base64_decode_lenient(segment: &str) -> Result<Vec<u8>, TokenError> {
    use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};

    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| TokenError::Encoding {
            reason: e.to_string(),
        })
}

/// Groups arrive as a JSON array or as a comma/whitespace-delimited string.
fn parse_groups(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Resolves [`AuthState`] from the shared session provider.
#[derive(Clone)]
pub struct AuthResolver {
    session: Arc<dyn SessionProvider>,
}

impl fmt::Debug for AuthResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResolver").finish_non_exhaustive()
    }
}

impl AuthResolver {
    /// Resolver over `session`.
    #[must_use]
    pub fn new(session: Arc<dyn SessionProvider>) -> Self {
        Self { session }
    }

    /// Fetch the current session and derive the auth state. Never fails.
    pub async fn get_auth_state(&self) -> AuthState {
        let tokens = match self.session.fetch_session().await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(error = %e, "session fetch failed, treating as signed out");
                return AuthState::signed_out();
            }
        };
        match tokens.id_token.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => AuthState::from_token(token),
            None => AuthState::signed_out(),
        }
    }

    /// Like [`get_auth_state`](Self::get_auth_state), but gives up after
    /// `timeout`. `None` means the provider did not answer in time.
    pub async fn get_auth_state_within(&self, timeout: Duration) -> Option<AuthState> {
        if let Ok(state) = tokio::time::timeout(timeout, self.get_auth_state()).await {
            Some(state)
        } else {
            warn!(timeout_ms = timeout.as_millis(), "session fetch timed out");
            None
        }
    }
}

/// Test helper: build an unsigned token around `claims`.
#[cfg(test)]
pub(crate) fn test_token(claims: &Value) -> String {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
