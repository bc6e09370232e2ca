//! Integration tests for configuration and the public newtypes.

use std::time::Duration;

use shop_connect::webhooks::WebhookTopic;
use shop_connect::{
    ApiKey, ApiSecretKey, ApiVersion, AuthScopes, ConfigError, ConnectConfig, HostUrl, ShopDomain,
};

#[test]
fn test_full_workflow_create_newtypes_build_config_access_fields() {
    let scopes: AuthScopes = "read_products, read_orders".parse().unwrap();

    let config = ConnectConfig::builder()
        .api_key(ApiKey::new("test-api-key").unwrap())
        .api_secret_key(ApiSecretKey::new("test-api-secret").unwrap())
        .scopes(scopes.clone())
        .host(HostUrl::new("https://myapp.example.com").unwrap())
        .api_version(ApiVersion::V2026_04)
        .request_timeout(Duration::from_secs(3))
        .business_topics(vec![WebhookTopic::OrdersCreate])
        .build()
        .unwrap();

    assert_eq!(config.api_key().as_ref(), "test-api-key");
    assert_eq!(config.api_version(), &ApiVersion::V2026_04);
    assert_eq!(config.host().unwrap().as_ref(), "https://myapp.example.com");
    assert_eq!(config.scopes(), &scopes);
    assert_eq!(config.request_timeout(), Duration::from_secs(3));
    assert_eq!(config.business_topics(), &[WebhookTopic::OrdersCreate]);
    assert_eq!(config.scopes().to_string(), "read_orders,read_products");
}

#[test]
fn test_error_handling_invalid_inputs_produce_correct_errors() {
    assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
    assert!(matches!(
        ApiSecretKey::new(""),
        Err(ConfigError::EmptyApiSecretKey)
    ));
    assert!(matches!(
        ShopDomain::new("evil.example.com"),
        Err(ConfigError::InvalidShopDomain { .. })
    ));
    assert!(matches!(
        "2024".parse::<ApiVersion>(),
        Err(ConfigError::InvalidApiVersion { .. })
    ));
    assert!(matches!(
        HostUrl::new("no-scheme.example.com"),
        Err(ConfigError::InvalidHostUrl { .. })
    ));

    let missing_secret = ConnectConfig::builder()
        .api_key(ApiKey::new("key").unwrap())
        .build();
    assert!(matches!(
        missing_secret,
        Err(ConfigError::MissingRequiredField {
            field: "api_secret_key"
        })
    ));
}

#[test]
fn test_write_scopes_are_rejected_at_build_time() {
    let result = ConnectConfig::builder()
        .api_key(ApiKey::new("key").unwrap())
        .api_secret_key(ApiSecretKey::new("secret").unwrap())
        .scopes("read_products,write_orders".parse().unwrap())
        .build();

    assert!(matches!(result, Err(ConfigError::InvalidScopes { .. })));
}

#[test]
fn test_config_can_be_cloned_and_shared() {
    let config = ConnectConfig::builder()
        .api_key(ApiKey::new("shared-key").unwrap())
        .api_secret_key(ApiSecretKey::new("shared-secret").unwrap())
        .build()
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let config = config.clone();
            std::thread::spawn(move || config.api_key().as_ref().to_string())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), "shared-key");
    }
}

#[test]
fn test_secret_never_appears_in_debug_output() {
    let config = ConnectConfig::builder()
        .api_key(ApiKey::new("key").unwrap())
        .api_secret_key(ApiSecretKey::new("very-secret-value").unwrap())
        .old_api_secret_key(ApiSecretKey::new("older-secret-value").unwrap())
        .build()
        .unwrap();

    let debug = format!("{config:?}");
    assert!(!debug.contains("very-secret-value"));
    assert!(!debug.contains("older-secret-value"));
}
