//! The keyed connection repository and its in-memory implementation.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{ConnectionChange, ReconnectPolicy, StoreConnection, StoreError};
use crate::config::ShopDomain;
use crate::BoxFuture;

/// Authoritative storage for [`StoreConnection`] records, keyed by shop.
///
/// Implementations must make `upsert`, `update` and `remove` atomic per key:
/// a reconnect racing a `shop/redact` delivery must end with the shop either
/// fully connected or absent, never with a half-written record.
///
/// # Example
///
/// ```rust
/// # async fn run() -> Result<(), shop_connect::store::StoreError> {
/// use shop_connect::store::{InMemoryStoreRegistry, StoreRegistry};
/// use shop_connect::ShopDomain;
///
/// let registry = InMemoryStoreRegistry::new();
/// let shop = ShopDomain::new("demo-store").unwrap();
/// assert!(registry.get(&shop).await?.is_none());
/// # Ok(())
/// # }
/// ```
pub trait StoreRegistry: Send + Sync {
    /// Returns the connection for `shop`, if any.
    fn get<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>>;

    /// Returns every stored connection.
    fn list(&self) -> BoxFuture<'_, Result<Vec<StoreConnection>, StoreError>>;

    /// Inserts `connection`, or merges it over the existing record for the
    /// same shop via [`StoreConnection::reconnect_over`]. Returns what was
    /// stored.
    fn upsert(
        &self,
        connection: StoreConnection,
        policy: ReconnectPolicy,
    ) -> BoxFuture<'_, Result<StoreConnection, StoreError>>;

    /// Applies `change` to the record for `shop`. Returns the updated record,
    /// or `None` if the shop is not connected.
    fn update<'a>(
        &'a self,
        shop: &'a ShopDomain,
        change: ConnectionChange,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>>;

    /// Removes the record for `shop`, returning it if it existed.
    fn remove<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>>;
}

/// [`StoreRegistry`] held in process memory.
///
/// Every mutation runs under a single write lock, which serializes operations
/// on the same key.
#[derive(Debug, Default)]
pub struct InMemoryStoreRegistry {
    connections: RwLock<HashMap<ShopDomain, StoreConnection>>,
}

impl InMemoryStoreRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreRegistry for InMemoryStoreRegistry {
    fn get<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>> {
        Box::pin(async move { Ok(self.connections.read().await.get(shop).cloned()) })
    }

    fn list(&self) -> BoxFuture<'_, Result<Vec<StoreConnection>, StoreError>> {
        Box::pin(async move {
            let mut all: Vec<StoreConnection> =
                self.connections.read().await.values().cloned().collect();
            all.sort_by(|a, b| a.shop.cmp(&b.shop));
            Ok(all)
        })
    }

    fn upsert(
        &self,
        connection: StoreConnection,
        policy: ReconnectPolicy,
    ) -> BoxFuture<'_, Result<StoreConnection, StoreError>> {
        Box::pin(async move {
            let mut connections = self.connections.write().await;
            let merged = match connections.get(&connection.shop) {
                Some(existing) => connection.reconnect_over(existing, policy),
                None => connection,
            };
            connections.insert(merged.shop.clone(), merged.clone());
            Ok(merged)
        })
    }

    fn update<'a>(
        &'a self,
        shop: &'a ShopDomain,
        change: ConnectionChange,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>> {
        Box::pin(async move {
            let mut connections = self.connections.write().await;
            Ok(connections.get_mut(shop).map(|connection| {
                connection.apply(change);
                connection.clone()
            }))
        })
    }

    fn remove<'a>(
        &'a self,
        shop: &'a ShopDomain,
    ) -> BoxFuture<'a, Result<Option<StoreConnection>, StoreError>> {
        Box::pin(async move { Ok(self.connections.write().await.remove(shop)) })
    }
}

// Verify InMemoryStoreRegistry is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InMemoryStoreRegistry>();
};
