//! Store disconnection with best-effort remote token revocation.

use std::sync::Arc;

use thiserror::Error;

use crate::clients::ProviderClient;
use crate::config::ShopDomain;
use crate::error::status_suffix;
use crate::store::{ConnectionStatus, StoreError, StoreRegistry};

/// Failure to revoke a token at the provider.
///
/// Never fatal: the local connection is removed regardless.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevocationError {
    /// The revocation request failed or returned a non-2xx status.
    #[error("Token revocation failed{}", status_suffix(.status))]
    RevocationFailed {
        /// HTTP status returned by the provider, if any.
        status: Option<u16>,
    },
}

/// Result of [`RevocationService::disconnect`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// A connection existed and was removed.
    pub removed: bool,
    /// The provider confirmed the token was revoked.
    pub remote_revoked: bool,
    /// Why remote revocation failed, if it was attempted and failed.
    pub revocation_error: Option<RevocationError>,
}

/// Disconnects stores: revokes the token remotely, then forgets it locally.
#[derive(Clone)]
pub struct RevocationService {
    provider: ProviderClient,
    registry: Arc<dyn StoreRegistry>,
}

impl std::fmt::Debug for RevocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationService")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl RevocationService {
    #[must_use]
    pub fn new(provider: ProviderClient, registry: Arc<dyn StoreRegistry>) -> Self {
        Self { provider, registry }
    }

    /// Disconnects `shop`.
    ///
    /// For a connected store the token is revoked at the provider under the
    /// client timeout. A revocation failure is logged and reported in the
    /// outcome; the local record is removed either way. Revoked connections
    /// (the app was already uninstalled) skip the remote call. Disconnecting
    /// an unknown shop is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only if the registry itself fails.
    pub async fn disconnect(&self, shop: &ShopDomain) -> Result<DisconnectOutcome, StoreError> {
        let mut outcome = DisconnectOutcome::default();

        if let Some(existing) = self.registry.get(shop).await? {
            if existing.status == ConnectionStatus::Connected {
                match self
                    .provider
                    .revoke_token(shop, &existing.access_token)
                    .await
                {
                    Ok(()) => outcome.remote_revoked = true,
                    Err(error) => {
                        tracing::warn!(
                            shop = %shop,
                            error = %error,
                            "remote token revocation failed, removing connection anyway"
                        );
                        outcome.revocation_error = Some(RevocationError::RevocationFailed {
                            status: error.status(),
                        });
                    }
                }
            }
        }

        outcome.removed = self.registry.remove(shop).await?.is_some();
        tracing::info!(
            shop = %shop,
            removed = outcome.removed,
            remote_revoked = outcome.remote_revoked,
            "store disconnected"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ConnectConfig, HostUrl};
    use crate::store::{
        AccessToken, ConnectionChange, InMemoryStoreRegistry, ReconnectPolicy, ShopMetadata,
        StoreConnection,
    };
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service(server: &MockServer, registry: Arc<InMemoryStoreRegistry>) -> RevocationService {
        let config = ConnectConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .provider_base_url(HostUrl::new(server.uri()).unwrap())
            .request_timeout(Duration::from_millis(300))
            .build()
            .unwrap();
        RevocationService::new(ProviderClient::new(&config).unwrap(), registry)
    }

    async fn connected(registry: &InMemoryStoreRegistry, name: &str) -> ShopDomain {
        let shop = ShopDomain::new(name).unwrap();
        registry
            .upsert(
                StoreConnection::new(
                    shop.clone(),
                    AccessToken::new("tok_x"),
                    "read_products".parse().unwrap(),
                    ShopMetadata::default(),
                ),
                ReconnectPolicy::default(),
            )
            .await
            .unwrap();
        shop
    }

    #[tokio::test]
    async fn test_disconnect_revokes_then_removes() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/api_permissions/current.json"))
            .and(header("X-Shopify-Access-Token", "tok_x"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        let registry = Arc::new(InMemoryStoreRegistry::new());
        let shop = connected(&registry, "demo-store").await;

        let outcome = service(&server, registry.clone())
            .disconnect(&shop)
            .await
            .unwrap();

        assert!(outcome.removed);
        assert!(outcome.remote_revoked);
        assert!(outcome.revocation_error.is_none());
        assert!(registry.get(&shop).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_failure_still_removes_locally() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/api_permissions/current.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let registry = Arc::new(InMemoryStoreRegistry::new());
        let shop = connected(&registry, "demo-store").await;

        let outcome = service(&server, registry.clone())
            .disconnect(&shop)
            .await
            .unwrap();

        assert!(outcome.removed);
        assert!(!outcome.remote_revoked);
        assert_eq!(
            outcome.revocation_error,
            Some(RevocationError::RevocationFailed { status: Some(503) })
        );
        assert!(registry.get(&shop).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remote_timeout_still_removes_locally() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;
        let registry = Arc::new(InMemoryStoreRegistry::new());
        let shop = connected(&registry, "demo-store").await;

        let outcome = service(&server, registry.clone())
            .disconnect(&shop)
            .await
            .unwrap();

        assert!(outcome.removed);
        assert_eq!(
            outcome.revocation_error,
            Some(RevocationError::RevocationFailed { status: None })
        );
    }

    #[tokio::test]
    async fn test_revoked_connection_skips_remote_call() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let registry = Arc::new(InMemoryStoreRegistry::new());
        let shop = connected(&registry, "demo-store").await;
        registry
            .update(&shop, ConnectionChange::Status(ConnectionStatus::Revoked))
            .await
            .unwrap();

        let outcome = service(&server, registry.clone())
            .disconnect(&shop)
            .await
            .unwrap();

        assert!(outcome.removed);
        assert!(!outcome.remote_revoked);
    }

    #[tokio::test]
    async fn test_unknown_shop_is_a_no_op() {
        let server = MockServer::start().await;
        let registry = Arc::new(InMemoryStoreRegistry::new());

        let outcome = service(&server, registry)
            .disconnect(&ShopDomain::new("nobody").unwrap())
            .await
            .unwrap();

        assert_eq!(outcome, DisconnectOutcome::default());
    }
}
