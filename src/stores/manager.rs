//! Read and disconnect operations for the client-facing store list.

use std::sync::Arc;

use crate::config::ShopDomain;
use crate::store::{StoreError, StoreRegistry, StoreSummary};
use crate::stores::{DisconnectOutcome, RevocationService};

/// Lists, inspects and disconnects stores.
///
/// Every read returns [`StoreSummary`], which carries no access token.
#[derive(Clone)]
pub struct StoreManager {
    registry: Arc<dyn StoreRegistry>,
    revocation: RevocationService,
}

impl std::fmt::Debug for StoreManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreManager")
            .field("revocation", &self.revocation)
            .finish_non_exhaustive()
    }
}

impl StoreManager {
    #[must_use]
    pub fn new(registry: Arc<dyn StoreRegistry>, revocation: RevocationService) -> Self {
        Self {
            registry,
            revocation,
        }
    }

    /// Returns a summary of every stored connection, ordered by shop.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry fails.
    pub async fn list_stores(&self) -> Result<Vec<StoreSummary>, StoreError> {
        let connections = self.registry.list().await?;
        Ok(connections.iter().map(|c| c.summary()).collect())
    }

    /// Returns the summary for `shop`, if connected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry fails.
    pub async fn get_store(&self, shop: &ShopDomain) -> Result<Option<StoreSummary>, StoreError> {
        Ok(self.registry.get(shop).await?.map(|c| c.summary()))
    }

    /// Disconnects `shop`; see [`RevocationService::disconnect`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the registry fails.
    pub async fn disconnect_store(
        &self,
        shop: &ShopDomain,
    ) -> Result<DisconnectOutcome, StoreError> {
        self.revocation.disconnect(shop).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::ProviderClient;
    use crate::config::{ApiKey, ApiSecretKey, ConnectConfig, HostUrl};
    use crate::store::{
        AccessToken, InMemoryStoreRegistry, ReconnectPolicy, ShopMetadata, StoreConnection,
    };
    use wiremock::MockServer;

    async fn manager_with(shops: &[&str]) -> (MockServer, StoreManager) {
        let server = MockServer::start().await;
        let config = ConnectConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .provider_base_url(HostUrl::new(server.uri()).unwrap())
            .build()
            .unwrap();
        let registry = Arc::new(InMemoryStoreRegistry::new());
        for shop in shops {
            registry
                .upsert(
                    StoreConnection::new(
                        ShopDomain::new(*shop).unwrap(),
                        AccessToken::new("tok_secret_value"),
                        "read_products".parse().unwrap(),
                        ShopMetadata::default(),
                    ),
                    ReconnectPolicy::default(),
                )
                .await
                .unwrap();
        }
        let revocation =
            RevocationService::new(ProviderClient::new(&config).unwrap(), registry.clone());
        (server, StoreManager::new(registry, revocation))
    }

    #[tokio::test]
    async fn test_list_stores_is_sorted_and_tokenless() {
        let (_server, manager) = manager_with(&["zeta-shop", "alpha-shop"]).await;

        let stores = manager.list_stores().await.unwrap();

        let names: Vec<_> = stores.iter().map(|s| s.shop.as_ref()).collect();
        assert_eq!(names, vec!["alpha-shop", "zeta-shop"]);
        let json = serde_json::to_string(&stores).unwrap();
        assert!(!json.contains("tok_secret_value"));
    }

    #[tokio::test]
    async fn test_get_store_returns_none_for_unknown_shop() {
        let (_server, manager) = manager_with(&["alpha-shop"]).await;

        let found = manager
            .get_store(&ShopDomain::new("alpha-shop").unwrap())
            .await
            .unwrap();
        let missing = manager
            .get_store(&ShopDomain::new("beta-shop").unwrap())
            .await
            .unwrap();

        assert!(found.is_some());
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_store_removes_even_when_provider_rejects() {
        // No mocks mounted: the mock server answers 404 to the revocation call.
        let (_server, manager) = manager_with(&["alpha-shop"]).await;
        let shop = ShopDomain::new("alpha-shop").unwrap();

        let outcome = manager.disconnect_store(&shop).await.unwrap();

        assert!(outcome.removed);
        assert!(!outcome.remote_revoked);
        assert!(manager.get_store(&shop).await.unwrap().is_none());
    }
}
