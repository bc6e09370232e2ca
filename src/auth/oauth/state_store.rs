//! Single-use storage for in-flight OAuth states.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::auth::oauth::hmac::constant_time_compare;
use crate::auth::oauth::{OAuthError, StateParam};
use crate::config::ShopDomain;
use crate::store::StoreError;
use crate::BoxFuture;

/// A state nonce issued for one authorize redirect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthState {
    /// The nonce sent as `state`.
    pub nonce: StateParam,
    /// The shop the redirect was issued for.
    pub shop: ShopDomain,
    /// When the nonce was issued.
    pub created_at: DateTime<Utc>,
    /// How long the nonce stays valid.
    pub ttl: Duration,
}

impl OAuthState {
    /// Issues a new random nonce for `shop`.
    #[must_use]
    pub fn issue(shop: ShopDomain, ttl: Duration) -> Self {
        Self {
            nonce: StateParam::new(),
            shop,
            created_at: Utc::now(),
            ttl,
        }
    }

    /// Returns `true` once `ttl` has elapsed at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= self.ttl)
    }
}

/// Storage for issued OAuth states, one in-flight attempt per shop.
///
/// Issuing a second state for a shop replaces the first.
pub trait StateStore: Send + Sync {
    /// Stores `state`, replacing any earlier state for the same shop.
    fn put(&self, state: OAuthState) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Removes and returns the state stored for `shop`.
    ///
    /// Must be atomic: two concurrent calls for the same shop return the
    /// entry to at most one of them.
    fn take<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<OAuthState>, StoreError>>;
}

/// Consumes the stored state for `shop` and checks it against `presented`.
///
/// The entry is removed before it is inspected, so it is gone whether the
/// check passes or not.
///
/// # Errors
///
/// Returns [`OAuthError::CsrfStateMismatch`] if no state is stored, the state
/// expired, or the nonce differs; [`OAuthError::Store`] if the store fails.
pub async fn consume_state(
    store: &dyn StateStore,
    shop: &ShopDomain,
    presented: &str,
) -> Result<(), OAuthError> {
    let Some(stored) = store.take(shop).await? else {
        tracing::warn!(shop = %shop, "no OAuth state stored for shop");
        return Err(OAuthError::CsrfStateMismatch);
    };

    if stored.is_expired_at(Utc::now()) {
        tracing::warn!(shop = %shop, "OAuth state expired");
        return Err(OAuthError::CsrfStateMismatch);
    }

    if !constant_time_compare(stored.nonce.nonce(), presented) {
        tracing::warn!(shop = %shop, "OAuth state nonce mismatch");
        return Err(OAuthError::CsrfStateMismatch);
    }

    tracing::debug!(shop = %shop, "OAuth state consumed");
    Ok(())
}

/// In-process [`StateStore`] backed by a mutex-guarded map.
///
/// Expiry is checked lazily by [`consume_state`]; call
/// [`purge_expired`](Self::purge_expired) periodically to bound memory when
/// many redirects are abandoned.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    states: Mutex<HashMap<ShopDomain, OAuthState>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut states = self.states.lock().await;
        let before = states.len();
        states.retain(|_, state| !state.is_expired_at(now));
        before - states.len()
    }

    /// Returns the number of stored states, expired ones included.
    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }

    /// Returns `true` if no states are stored.
    pub async fn is_empty(&self) -> bool {
        self.states.lock().await.is_empty()
    }
}

impl StateStore for InMemoryStateStore {
    fn put(&self, state: OAuthState) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            self.states.lock().await.insert(state.shop.clone(), state);
            Ok(())
        })
    }

    fn take<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<OAuthState>, StoreError>> {
        Box::pin(async move { Ok(self.states.lock().await.remove(shop)) })
    }
}

// Verify InMemoryStateStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InMemoryStateStore>();
};

#[cfg(test)]
mod tests {
    use super::*;

    fn shop() -> ShopDomain {
        ShopDomain::new("demo-store").unwrap()
    }

    fn aged_state(age: chrono::Duration, ttl: Duration) -> OAuthState {
        let mut state = OAuthState::issue(shop(), ttl);
        state.created_at = Utc::now() - age;
        state
    }

    #[tokio::test]
    async fn test_state_is_single_use() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::issue(shop(), Duration::from_secs(600));
        let nonce = state.nonce.nonce().to_string();
        store.put(state).await.unwrap();

        assert!(consume_state(&store, &shop(), &nonce).await.is_ok());
        assert!(matches!(
            consume_state(&store, &shop(), &nonce).await,
            Err(OAuthError::CsrfStateMismatch)
        ));
    }

    #[tokio::test]
    async fn test_mismatched_nonce_still_consumes_entry() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::issue(shop(), Duration::from_secs(600));
        let nonce = state.nonce.nonce().to_string();
        store.put(state).await.unwrap();

        assert!(matches!(
            consume_state(&store, &shop(), "forged").await,
            Err(OAuthError::CsrfStateMismatch)
        ));
        assert!(matches!(
            consume_state(&store, &shop(), &nonce).await,
            Err(OAuthError::CsrfStateMismatch)
        ));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_expired_state_is_rejected() {
        let store = InMemoryStateStore::new();
        let state = aged_state(chrono::Duration::minutes(11), Duration::from_secs(600));
        let nonce = state.nonce.nonce().to_string();
        store.put(state).await.unwrap();

        assert!(matches!(
            consume_state(&store, &shop(), &nonce).await,
            Err(OAuthError::CsrfStateMismatch)
        ));
    }

    #[tokio::test]
    async fn test_state_for_other_shop_does_not_match() {
        let store = InMemoryStateStore::new();
        let state = OAuthState::issue(shop(), Duration::from_secs(600));
        let nonce = state.nonce.nonce().to_string();
        store.put(state).await.unwrap();

        let other = ShopDomain::new("other-store").unwrap();
        assert!(matches!(
            consume_state(&store, &other, &nonce).await,
            Err(OAuthError::CsrfStateMismatch)
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_entries() {
        let store = InMemoryStateStore::new();
        store
            .put(aged_state(chrono::Duration::minutes(20), Duration::from_secs(600)))
            .await
            .unwrap();
        store
            .put(OAuthState::issue(
                ShopDomain::new("fresh-store").unwrap(),
                Duration::from_secs(600),
            ))
            .await
            .unwrap();

        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let state = OAuthState::issue(shop(), Duration::from_secs(600));
        assert!(!state.is_expired_at(state.created_at));
        assert!(!state.is_expired_at(state.created_at + chrono::Duration::seconds(599)));
        assert!(state.is_expired_at(state.created_at + chrono::Duration::seconds(600)));
    }
}
