//! HTTP client for the provider endpoints the connection core calls.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::AuthScopes;
use crate::clients::ProviderError;
use crate::config::{ConnectConfig, ShopDomain};
use crate::store::{AccessToken, ShopMetadata};
use crate::webhooks::WebhookTopic;

/// Upper bound on establishing a TCP/TLS connection to the provider.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the Admin API access token.
pub const HEADER_ACCESS_TOKEN: &str = "X-Shopify-Access-Token";

/// Crate version, sent in the `User-Agent` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result of a successful authorization code exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    /// The offline access token.
    pub access_token: AccessToken,
    /// Scopes the merchant actually granted.
    pub scope: AuthScopes,
}

#[derive(Serialize)]
struct TokenExchangeRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
}

#[derive(Deserialize)]
struct TokenExchangeResponse {
    access_token: String,
    #[serde(default)]
    scope: AuthScopes,
}

#[derive(Deserialize)]
struct ShopEnvelope {
    shop: ShopResource,
}

#[derive(Deserialize)]
struct ShopResource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    iana_timezone: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    plan_name: Option<String>,
}

impl From<ShopResource> for ShopMetadata {
    fn from(shop: ShopResource) -> Self {
        Self {
            name: shop.name.unwrap_or_default(),
            email: shop.email.unwrap_or_default(),
            currency: shop.currency.unwrap_or_default(),
            timezone: shop.iana_timezone.or(shop.timezone).unwrap_or_default(),
            plan_name: shop.plan_name.unwrap_or_default(),
        }
    }
}

/// Thin wrapper over `reqwest` for the token, shop, webhook and revocation
/// endpoints.
///
/// Every request runs under [`ConnectConfig::request_timeout`] with a
/// [`CONNECT_TIMEOUT`] cap on connecting. Nothing is retried.
#[derive(Clone, Debug)]
pub struct ProviderClient {
    client: reqwest::Client,
    config: ConnectConfig,
}

// Verify ProviderClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ProviderClient>();
};

impl ProviderClient {
    /// Builds a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Network`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ConnectConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout())
            .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout()))
            .user_agent(format!("shop-connect v{SDK_VERSION}"))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Returns the configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ConnectConfig {
        &self.config
    }

    fn api_url(&self, shop: &ShopDomain, resource: &str) -> String {
        self.config.provider_url(
            shop,
            &format!("/admin/api/{}/{resource}", self.config.api_version()),
        )
    }

    /// Exchanges an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Status`] for a non-2xx response, [`ProviderError::Network`]
    /// for transport or decode failures.
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<TokenGrant, ProviderError> {
        let body = TokenExchangeRequest {
            client_id: self.config.api_key().as_ref(),
            client_secret: self.config.api_secret_key().as_ref(),
            code,
        };

        let response = self
            .client
            .post(self.config.provider_url(shop, "/admin/oauth/access_token"))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = ProviderError::check(response).await?;

        let token: TokenExchangeResponse = response.json().await?;
        Ok(TokenGrant {
            access_token: AccessToken::new(token.access_token),
            scope: token.scope,
        })
    }

    /// Fetches the shop's public metadata with `token`.
    ///
    /// # Errors
    ///
    /// Same as [`exchange_code`](Self::exchange_code).
    pub async fn fetch_shop(
        &self,
        shop: &ShopDomain,
        token: &AccessToken,
    ) -> Result<ShopMetadata, ProviderError> {
        let response = self
            .client
            .get(self.api_url(shop, "shop.json"))
            .header(HEADER_ACCESS_TOKEN, token.as_ref())
            .header("Accept", "application/json")
            .send()
            .await?;
        let response = ProviderError::check(response).await?;

        let envelope: ShopEnvelope = response.json().await?;
        Ok(envelope.shop.into())
    }

    /// Subscribes `address` to `topic` for the shop.
    ///
    /// # Errors
    ///
    /// Same as [`exchange_code`](Self::exchange_code). A topic that is already
    /// subscribed comes back as [`ProviderError::Status`]; callers decide
    /// whether that counts as success.
    pub async fn create_webhook(
        &self,
        shop: &ShopDomain,
        token: &AccessToken,
        topic: WebhookTopic,
        address: &str,
    ) -> Result<(), ProviderError> {
        let body = json!({
            "webhook": {
                "topic": topic.as_str(),
                "address": address,
                "format": "json",
            }
        });

        let response = self
            .client
            .post(self.api_url(shop, "webhooks.json"))
            .header(HEADER_ACCESS_TOKEN, token.as_ref())
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        ProviderError::check(response).await?;
        Ok(())
    }

    /// Revokes `token`, uninstalling the app from the shop.
    ///
    /// # Errors
    ///
    /// Same as [`exchange_code`](Self::exchange_code).
    pub async fn revoke_token(
        &self,
        shop: &ShopDomain,
        token: &AccessToken,
    ) -> Result<(), ProviderError> {
        let response = self
            .client
            .delete(
                self.config
                    .provider_url(shop, "/admin/api_permissions/current.json"),
            )
            .header(HEADER_ACCESS_TOKEN, token.as_ref())
            .send()
            .await?;
        ProviderError::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKey, ApiSecretKey, ApiVersion, HostUrl};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> ProviderClient {
        let config = ConnectConfig::builder()
            .api_key(ApiKey::new("client-id").unwrap())
            .api_secret_key(ApiSecretKey::new("client-secret").unwrap())
            .api_version(ApiVersion::V2026_07)
            .provider_base_url(HostUrl::new(server.uri()).unwrap())
            .request_timeout(timeout)
            .build()
            .unwrap();
        ProviderClient::new(&config).unwrap()
    }

    fn shop() -> ShopDomain {
        ShopDomain::new("demo-store").unwrap()
    }

    #[tokio::test]
    async fn test_exchange_code_posts_credentials_and_parses_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .and(body_json(json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "code": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok_x",
                "scope": "read_products"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let grant = client.exchange_code(&shop(), "abc123").await.unwrap();

        assert_eq!(grant.access_token.as_ref(), "tok_x");
        assert_eq!(grant.scope.to_string(), "read_products");
    }

    #[tokio::test]
    async fn test_exchange_code_reports_status_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("invalid code client-secret echoed"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let error = client.exchange_code(&shop(), "bad").await.unwrap_err();

        assert_eq!(error.status(), Some(400));
        assert!(!error.to_string().contains("client-secret"));
    }

    #[tokio::test]
    async fn test_fetch_shop_sends_token_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2026-07/shop.json"))
            .and(header(HEADER_ACCESS_TOKEN, "tok_x"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "shop": {
                    "name": "Demo Store",
                    "email": "owner@demo.example",
                    "currency": "CAD",
                    "timezone": "(GMT-05:00) Eastern Time (US & Canada)",
                    "iana_timezone": "America/Toronto",
                    "plan_name": "shopify_plus"
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let metadata = client
            .fetch_shop(&shop(), &AccessToken::new("tok_x"))
            .await
            .unwrap();

        assert_eq!(metadata.name, "Demo Store");
        assert_eq!(metadata.currency, "CAD");
        assert_eq!(metadata.timezone, "America/Toronto");
        assert_eq!(metadata.plan_name, "shopify_plus");
    }

    #[tokio::test]
    async fn test_create_webhook_posts_topic_address_and_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2026-07/webhooks.json"))
            .and(body_json(json!({
                "webhook": {
                    "topic": "shop/redact",
                    "address": "https://app.example.com/webhooks",
                    "format": "json"
                }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        client
            .create_webhook(
                &shop(),
                &AccessToken::new("tok_x"),
                WebhookTopic::ShopRedact,
                "https://app.example.com/webhooks",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_token_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/admin/api_permissions/current.json"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_millis(200));
        let error = client
            .revoke_token(&shop(), &AccessToken::new("tok_x"))
            .await
            .unwrap_err();

        assert!(matches!(error, ProviderError::Network(_)));
        assert_eq!(error.status(), None);
    }
}
