//! Store management and disconnection through the connector.

use std::sync::Arc;

use shop_connect::auth::oauth::InMemoryStateStore;
use shop_connect::store::{
    AccessToken, InMemoryStoreRegistry, ReconnectPolicy, ShopMetadata, StoreConnection,
    StoreRegistry,
};
use shop_connect::stores::RevocationError;
use shop_connect::{ApiKey, ApiSecretKey, ConnectConfig, HostUrl, ShopDomain, StoreConnector};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn connector_with_store(server: &MockServer) -> (StoreConnector, Arc<InMemoryStoreRegistry>) {
    let config = ConnectConfig::builder()
        .api_key(ApiKey::new("client-id").unwrap())
        .api_secret_key(ApiSecretKey::new("secret").unwrap())
        .provider_base_url(HostUrl::new(server.uri()).unwrap())
        .build()
        .unwrap();
    let registry = Arc::new(InMemoryStoreRegistry::new());
    registry
        .upsert(
            StoreConnection::new(
                ShopDomain::new("demo-store").unwrap(),
                AccessToken::new("tok_very_secret"),
                "read_products,read_orders".parse().unwrap(),
                ShopMetadata {
                    name: "Demo Store".to_string(),
                    currency: "USD".to_string(),
                    ..ShopMetadata::default()
                },
            ),
            ReconnectPolicy::default(),
        )
        .await
        .unwrap();
    let connector = StoreConnector::new(
        config,
        Arc::new(InMemoryStateStore::new()),
        registry.clone(),
    )
    .unwrap();
    (connector, registry)
}

#[tokio::test]
async fn test_disconnect_with_remote_failure_removes_locally() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/admin/api_permissions/current.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("tok_very_secret is invalid"))
        .expect(1)
        .mount(&server)
        .await;
    let (connector, registry) = connector_with_store(&server).await;
    let shop = ShopDomain::new("demo-store").unwrap();

    let outcome = connector.manager().disconnect_store(&shop).await.unwrap();

    assert!(outcome.removed);
    assert!(!outcome.remote_revoked);
    let error = outcome.revocation_error.unwrap();
    assert_eq!(error, RevocationError::RevocationFailed { status: Some(401) });
    assert!(!error.to_string().contains("tok_very_secret"));
    assert!(registry.get(&shop).await.unwrap().is_none());
}

#[tokio::test]
async fn test_store_summary_json_has_no_token() {
    let server = MockServer::start().await;
    let (connector, _registry) = connector_with_store(&server).await;

    let stores = connector.manager().list_stores().await.unwrap();
    let json = serde_json::to_value(&stores).unwrap();

    assert_eq!(json[0]["shop"], "demo-store");
    assert_eq!(json[0]["metadata"]["name"], "Demo Store");
    assert_eq!(json[0]["status"], "connected");
    assert!(json[0].get("access_token").is_none());
    assert!(!json.to_string().contains("tok_very_secret"));
}

#[tokio::test]
async fn test_access_token_is_masked_in_debug_output() {
    let server = MockServer::start().await;
    let (_connector, registry) = connector_with_store(&server).await;

    let stored = registry
        .get(&ShopDomain::new("demo-store").unwrap())
        .await
        .unwrap()
        .unwrap();

    assert!(!format!("{stored:?}").contains("tok_very_secret"));
}
