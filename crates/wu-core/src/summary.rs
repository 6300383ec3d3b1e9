//! Optimistic user summary.
//!
//! A small record of who was signed in last, kept in local storage so the
//! next page load can paint signed-in chrome before the session fetch
//! returns. Entries expire after a short TTL and are dropped as soon as the
//! authoritative auth state disagrees with them.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use wu_storage::{StorageError, WebStorage};

use crate::auth::{AuthState, Role};

/// Local-storage key of the cached summary.
pub const SUMMARY_KEY: &str = "wu:user-summary";

/// The cached record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub subject_id: Option<String>,
    pub role: Option<Role>,
    pub display_name: Option<String>,
    /// Unix seconds when the entry was written.
    pub stored_at: u64,
}

impl UserSummary {
    /// Summary of a signed-in state, stamped now.
    #[must_use]
    pub fn from_state(state: &AuthState) -> Self {
        Self {
            subject_id: state.subject_id().map(str::to_owned),
            role: state.role(),
            display_name: state.display_name().map(str::to_owned),
            stored_at: unix_now(),
        }
    }

    /// Whether `state` describes the same user and role.
    #[must_use]
    pub fn matches(&self, state: &AuthState) -> bool {
        state.signed_in()
            && self.subject_id.as_deref() == state.subject_id()
            && self.role == state.role()
    }

    /// The provisional auth state to paint with.
    #[must_use]
    pub fn to_state(&self) -> AuthState {
        AuthState::optimistic(self.subject_id.clone(), self.role, self.display_name.clone())
    }
}

/// TTL-bounded cache of the [`UserSummary`].
#[derive(Clone)]
pub struct SummaryCache {
    storage: Arc<dyn WebStorage>,
    ttl: Duration,
}

impl std::fmt::Debug for SummaryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryCache")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SummaryCache {
    /// Cache over `storage` (local scope) with entry lifetime `ttl`.
    #[must_use]
    pub fn new(storage: Arc<dyn WebStorage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    /// The cached summary, if present, well-formed and fresh. Stale and
    /// malformed entries are removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    pub async fn get(&self) -> Result<Option<UserSummary>, StorageError> {
        let Some(raw) = self.storage.get(SUMMARY_KEY).await? else {
            return Ok(None);
        };
        let summary = match serde_json::from_str::<UserSummary>(&raw) {
            Ok(s) => s,
            Err(e) => {
                debug!(error = %e, "discarding malformed user summary");
                self.storage.remove(SUMMARY_KEY).await?;
                return Ok(None);
            }
        };
        let age = unix_now().saturating_sub(summary.stored_at);
        if age >= self.ttl.as_secs() {
            debug!(age_secs = age, "discarding expired user summary");
            self.storage.remove(SUMMARY_KEY).await?;
            return Ok(None);
        }
        Ok(Some(summary))
    }

    /// Store `summary`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    pub async fn put(&self, summary: &UserSummary) -> Result<(), StorageError> {
        let raw = serde_json::to_string(summary).map_err(|e| StorageError::Write {
            key: SUMMARY_KEY.to_owned(),
            reason: e.to_string(),
        })?;
        self.storage.set(SUMMARY_KEY, &raw).await
    }

    /// Drop the cached summary.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    pub async fn invalidate(&self) -> Result<(), StorageError> {
        self.storage.remove(SUMMARY_KEY).await
    }

    /// Provisional state from a fresh cached summary.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    pub async fn optimistic_state(&self) -> Result<Option<AuthState>, StorageError> {
        Ok(self.get().await?.map(|s| s.to_state()))
    }

    /// Bring the cache in line with the authoritative `state`.
    ///
    /// Signing out or a change of subject/role invalidates the entry; a
    /// matching entry is refreshed. Returns `true` when auth changed relative
    /// to the cached entry.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store fails.
    pub async fn reconcile(&self, state: &AuthState) -> Result<bool, StorageError> {
        let cached = self.get().await?;
        let changed = match &cached {
            Some(summary) => !summary.matches(state),
            None => state.signed_in(),
        };

        if !state.signed_in() {
            if cached.is_some() {
                info!("signed out, clearing cached user summary");
                self.invalidate().await?;
            }
            return Ok(changed);
        }

        if changed && cached.is_some() {
            info!(subject = state.subject_id(), "auth changed, replacing cached user summary");
        }
        self.put(&UserSummary::from_state(state)).await?;
        Ok(changed)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wu_storage::MemoryStorage;

    use super::*;
    use crate::auth::test_token;

    fn cache() -> (SummaryCache, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        let cache = SummaryCache::new(storage.clone(), Duration::from_secs(600));
        (cache, storage)
    }

    fn wrestler(sub: &str) -> AuthState {
        AuthState::from_token(&test_token(&json!({
            "sub": sub,
            "name": "Kid Lightning",
            "cognito:groups": ["Wrestlers"],
        })))
    }

    #[tokio::test]
    async fn empty_cache_reads_none() {
        let (cache, _) = cache();
        assert_eq!(cache.get().await.unwrap(), None);
        assert_eq!(cache.optimistic_state().await.unwrap(), None);
    }

    #[tokio::test]
    async fn reconcile_stores_and_optimistic_state_round_trips() {
        let (cache, _) = cache();
        let state = wrestler("w-1");

        assert!(cache.reconcile(&state).await.unwrap());
        let optimistic = cache.optimistic_state().await.unwrap().unwrap();
        assert!(optimistic.signed_in());
        assert!(optimistic.is_wrestler());
        assert_eq!(optimistic.subject_id(), Some("w-1"));
        assert_eq!(optimistic.display_name(), Some("Kid Lightning"));

        assert!(!cache.reconcile(&state).await.unwrap());
    }

    #[tokio::test]
    async fn expired_entry_is_removed() {
        let (cache, storage) = cache();
        let mut summary = UserSummary::from_state(&wrestler("w-1"));
        summary.stored_at -= 601;
        cache.put(&summary).await.unwrap();

        assert_eq!(cache.get().await.unwrap(), None);
        assert_eq!(storage.get(SUMMARY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_entry_is_removed() {
        let (cache, storage) = cache();
        storage.set(SUMMARY_KEY, "{not json").await.unwrap();
        assert_eq!(cache.get().await.unwrap(), None);
        assert_eq!(storage.get(SUMMARY_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn different_subject_counts_as_auth_change() {
        let (cache, _) = cache();
        cache.reconcile(&wrestler("w-1")).await.unwrap();

        assert!(cache.reconcile(&wrestler("w-2")).await.unwrap());
        let stored = cache.get().await.unwrap().unwrap();
        assert_eq!(stored.subject_id.as_deref(), Some("w-2"));
    }

    #[tokio::test]
    async fn sign_out_invalidates() {
        let (cache, storage) = cache();
        cache.reconcile(&wrestler("w-1")).await.unwrap();

        assert!(cache.reconcile(&AuthState::signed_out()).await.unwrap());
        assert_eq!(storage.get(SUMMARY_KEY).await.unwrap(), None);
        assert!(!cache.reconcile(&AuthState::signed_out()).await.unwrap());
    }
}
