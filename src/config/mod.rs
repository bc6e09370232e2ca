//! Configuration for the store-connection core.
//!
//! # Overview
//!
//! - [`ConnectConfig`]: credentials, scopes, app URLs, timeouts and topic selection
//! - [`ConnectConfigBuilder`]: fluent construction with validation
//! - [`ApiKey`], [`ApiSecretKey`], [`ShopDomain`], [`HostUrl`], [`ApiVersion`]:
//!   validated newtypes
//!
//! # Example
//!
//! ```rust
//! use shop_connect::{ConnectConfig, ApiKey, ApiSecretKey, HostUrl};
//!
//! let config = ConnectConfig::builder()
//!     .api_key(ApiKey::new("my-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("my-secret").unwrap())
//!     .host(HostUrl::new("https://myapp.example.com").unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.scopes().to_string(), "read_products");
//! ```

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, HostUrl, ShopDomain};
pub use version::ApiVersion;

use std::time::Duration;

use crate::auth::AuthScopes;
use crate::error::ConfigError;
use crate::webhooks::WebhookTopic;

/// Default timeout applied to every outbound provider request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of an issued OAuth state nonce.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Default scope list requested at install time.
pub const DEFAULT_SCOPES: &str = "read_products";

/// Configuration shared by every component of the connection core.
///
/// # Key Rotation
///
/// `old_api_secret_key` is tried when a signature fails to verify with the
/// primary secret, so callbacks and webhooks signed before a secret rotation
/// keep working until the old secret is removed.
///
/// # Provider Base URL
///
/// By default provider calls go to `https://<shop>.myshopify.com`. Setting
/// [`ConnectConfigBuilder::provider_base_url`] routes every call (authorize
/// redirect, token exchange, metadata, webhooks, revocation) through a fixed
/// base instead, e.g. an egress proxy or a local mock server.
#[derive(Clone, Debug)]
pub struct ConnectConfig {
    api_key: ApiKey,
    api_secret_key: ApiSecretKey,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: AuthScopes,
    host: Option<HostUrl>,
    redirect_path: String,
    webhook_path: String,
    api_version: ApiVersion,
    provider_base_url: Option<HostUrl>,
    request_timeout: Duration,
    state_ttl: Duration,
    business_topics: Vec<WebhookTopic>,
}

impl ConnectConfig {
    /// Creates a new builder for constructing a `ConnectConfig`.
    #[must_use]
    pub fn builder() -> ConnectConfigBuilder {
        ConnectConfigBuilder::new()
    }

    /// Builds a configuration from process environment variables.
    ///
    /// Required: `SHOPIFY_API_KEY`, `SHOPIFY_API_SECRET`, `SHOPIFY_APP_URL`.
    /// Optional: `SHOPIFY_API_SECRET_OLD`, `SHOPIFY_SCOPES`, `SHOPIFY_API_VERSION`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for an unset required variable, or
    /// the validation error of whichever value is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingEnvVar { name })
        };

        let mut builder = Self::builder()
            .api_key(ApiKey::new(require("SHOPIFY_API_KEY")?)?)
            .api_secret_key(ApiSecretKey::new(require("SHOPIFY_API_SECRET")?)?)
            .host(HostUrl::new(require("SHOPIFY_APP_URL")?)?);

        if let Some(old) = lookup("SHOPIFY_API_SECRET_OLD").filter(|v| !v.is_empty()) {
            builder = builder.old_api_secret_key(ApiSecretKey::new(old)?);
        }
        if let Some(scopes) = lookup("SHOPIFY_SCOPES") {
            builder = builder.scopes(scopes.parse()?);
        }
        if let Some(version) = lookup("SHOPIFY_API_VERSION") {
            builder = builder.api_version(version.parse()?);
        }

        builder.build()
    }

    /// Returns the API key (OAuth client id).
    #[must_use]
    pub const fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Returns the API secret key (OAuth client secret, webhook signing key).
    #[must_use]
    pub const fn api_secret_key(&self) -> &ApiSecretKey {
        &self.api_secret_key
    }

    /// Returns the previous secret key, if one is configured for rotation.
    #[must_use]
    pub const fn old_api_secret_key(&self) -> Option<&ApiSecretKey> {
        self.old_api_secret_key.as_ref()
    }

    /// Returns the scopes requested at install time.
    #[must_use]
    pub const fn scopes(&self) -> &AuthScopes {
        &self.scopes
    }

    /// Returns the application host URL, if configured.
    #[must_use]
    pub const fn host(&self) -> Option<&HostUrl> {
        self.host.as_ref()
    }

    /// Returns the callback path appended to the host for `redirect_uri`.
    #[must_use]
    pub fn redirect_path(&self) -> &str {
        &self.redirect_path
    }

    /// Returns the path appended to the host for webhook delivery addresses.
    #[must_use]
    pub fn webhook_path(&self) -> &str {
        &self.webhook_path
    }

    /// Returns the Admin API version.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Returns the timeout applied to every outbound provider call.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns how long an issued OAuth state stays valid.
    #[must_use]
    pub const fn state_ttl(&self) -> Duration {
        self.state_ttl
    }

    /// Returns the optional business topics registered after connecting.
    #[must_use]
    pub fn business_topics(&self) -> &[WebhookTopic] {
        &self.business_topics
    }

    /// Returns the base URL provider calls for `shop` are made against.
    #[must_use]
    pub fn provider_base(&self, shop: &ShopDomain) -> String {
        self.provider_base_url.as_ref().map_or_else(
            || format!("https://{}", shop.myshopify_domain()),
            |base| base.as_ref().to_string(),
        )
    }

    /// Returns the full provider URL for `path` on `shop`.
    #[must_use]
    pub fn provider_url(&self, shop: &ShopDomain, path: &str) -> String {
        format!("{}{}", self.provider_base(shop), path)
    }
}

// Verify ConnectConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ConnectConfig>();
};

/// Builder for [`ConnectConfig`].
///
/// # Defaults
///
/// - `scopes`: `read_products`
/// - `redirect_path`: `/auth/callback`
/// - `webhook_path`: `/webhooks`
/// - `api_version`: [`ApiVersion::latest`]
/// - `request_timeout`: 10 seconds
/// - `state_ttl`: 10 minutes
/// - `business_topics`: `orders/create`, `products/update`, `app/uninstalled`
#[derive(Debug, Default)]
pub struct ConnectConfigBuilder {
    api_key: Option<ApiKey>,
    api_secret_key: Option<ApiSecretKey>,
    old_api_secret_key: Option<ApiSecretKey>,
    scopes: Option<AuthScopes>,
    host: Option<HostUrl>,
    redirect_path: Option<String>,
    webhook_path: Option<String>,
    api_version: Option<ApiVersion>,
    provider_base_url: Option<HostUrl>,
    request_timeout: Option<Duration>,
    state_ttl: Option<Duration>,
    business_topics: Option<Vec<WebhookTopic>>,
}

impl ConnectConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    /// Sets the API secret key (required).
    #[must_use]
    pub fn api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.api_secret_key = Some(key);
        self
    }

    /// Sets the previous secret key accepted during a rotation window.
    #[must_use]
    pub fn old_api_secret_key(mut self, key: ApiSecretKey) -> Self {
        self.old_api_secret_key = Some(key);
        self
    }

    /// Sets the install scopes. Only read scopes are accepted.
    #[must_use]
    pub fn scopes(mut self, scopes: AuthScopes) -> Self {
        self.scopes = Some(scopes);
        self
    }

    /// Sets the application host URL.
    #[must_use]
    pub fn host(mut self, host: HostUrl) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the OAuth callback path.
    #[must_use]
    pub fn redirect_path(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = Some(path.into());
        self
    }

    /// Sets the webhook delivery path.
    #[must_use]
    pub fn webhook_path(mut self, path: impl Into<String>) -> Self {
        self.webhook_path = Some(path.into());
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn api_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }

    /// Routes every provider call through `base` instead of the shop's own host.
    #[must_use]
    pub fn provider_base_url(mut self, base: HostUrl) -> Self {
        self.provider_base_url = Some(base);
        self
    }

    /// Sets the outbound request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the OAuth state lifetime.
    #[must_use]
    pub const fn state_ttl(mut self, ttl: Duration) -> Self {
        self.state_ttl = Some(ttl);
        self
    }

    /// Replaces the optional business topics registered after connecting.
    #[must_use]
    pub fn business_topics(mut self, topics: Vec<WebhookTopic>) -> Self {
        self.business_topics = Some(topics);
        self
    }

    /// Builds the [`ConnectConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `api_key` or
    /// `api_secret_key` are not set, and [`ConfigError::InvalidScopes`] if the
    /// scope list is empty or requests write access.
    pub fn build(self) -> Result<ConnectConfig, ConfigError> {
        let api_key = self
            .api_key
            .ok_or(ConfigError::MissingRequiredField { field: "api_key" })?;
        let api_secret_key = self
            .api_secret_key
            .ok_or(ConfigError::MissingRequiredField {
                field: "api_secret_key",
            })?;

        let scopes = match self.scopes {
            Some(scopes) => scopes,
            None => DEFAULT_SCOPES.parse()?,
        };
        if scopes.is_empty() {
            return Err(ConfigError::InvalidScopes {
                reason: "at least one scope is required".to_string(),
            });
        }
        if let Some(scope) = scopes.iter().find(|s| !AuthScopes::is_read_only(s)) {
            return Err(ConfigError::InvalidScopes {
                reason: format!("'{scope}' is not a read-only scope"),
            });
        }

        Ok(ConnectConfig {
            api_key,
            api_secret_key,
            old_api_secret_key: self.old_api_secret_key,
            scopes,
            host: self.host,
            redirect_path: self
                .redirect_path
                .unwrap_or_else(|| "/auth/callback".to_string()),
            webhook_path: self.webhook_path.unwrap_or_else(|| "/webhooks".to_string()),
            api_version: self.api_version.unwrap_or_else(ApiVersion::latest),
            provider_base_url: self.provider_base_url,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            state_ttl: self.state_ttl.unwrap_or(DEFAULT_STATE_TTL),
            business_topics: self
                .business_topics
                .unwrap_or_else(|| WebhookTopic::BUSINESS.to_vec()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn minimal() -> ConnectConfigBuilder {
        ConnectConfig::builder()
            .api_key(ApiKey::new("key").unwrap())
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
    }

    #[test]
    fn test_builder_requires_api_key() {
        let result = ConnectConfigBuilder::new()
            .api_secret_key(ApiSecretKey::new("secret").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField { field: "api_key" })
        ));
    }

    #[test]
    fn test_builder_requires_api_secret_key() {
        let result = ConnectConfigBuilder::new()
            .api_key(ApiKey::new("key").unwrap())
            .build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "api_secret_key"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = minimal().build().unwrap();

        assert_eq!(config.api_version(), &ApiVersion::latest());
        assert_eq!(config.scopes().to_string(), DEFAULT_SCOPES);
        assert_eq!(config.redirect_path(), "/auth/callback");
        assert_eq!(config.webhook_path(), "/webhooks");
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(config.state_ttl(), DEFAULT_STATE_TTL);
        assert_eq!(config.business_topics(), WebhookTopic::BUSINESS);
        assert!(config.host().is_none());
        assert!(config.old_api_secret_key().is_none());
    }

    #[test]
    fn test_builder_rejects_write_scopes() {
        let result = minimal()
            .scopes("read_products,write_orders".parse().unwrap())
            .build();

        match result {
            Err(ConfigError::InvalidScopes { reason }) => {
                assert!(reason.contains("write_orders"));
            }
            other => panic!("expected InvalidScopes, got {other:?}"),
        }
    }

    #[test]
    fn test_provider_url_defaults_to_shop_host() {
        let config = minimal().build().unwrap();
        let shop = ShopDomain::new("demo-store").unwrap();

        assert_eq!(
            config.provider_url(&shop, "/admin/oauth/access_token"),
            "https://demo-store.myshopify.com/admin/oauth/access_token"
        );
    }

    #[test]
    fn test_provider_url_uses_override() {
        let config = minimal()
            .provider_base_url(HostUrl::new("http://127.0.0.1:9000").unwrap())
            .build()
            .unwrap();
        let shop = ShopDomain::new("demo-store").unwrap();

        assert_eq!(
            config.provider_url(&shop, "/admin/oauth/access_token"),
            "http://127.0.0.1:9000/admin/oauth/access_token"
        );
    }

    #[test]
    fn test_from_lookup_reads_required_and_optional_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SHOPIFY_API_KEY", "env-key"),
            ("SHOPIFY_API_SECRET", "env-secret"),
            ("SHOPIFY_API_SECRET_OLD", "env-old-secret"),
            ("SHOPIFY_APP_URL", "https://app.example.com"),
            ("SHOPIFY_SCOPES", "read_products,read_orders"),
            ("SHOPIFY_API_VERSION", "2026-04"),
        ]);

        let config =
            ConnectConfig::from_lookup(|name| env.get(name).map(ToString::to_string)).unwrap();

        assert_eq!(config.api_key().as_ref(), "env-key");
        assert_eq!(config.api_secret_key().as_ref(), "env-secret");
        assert_eq!(
            config.old_api_secret_key().map(|k| k.as_ref()),
            Some("env-old-secret")
        );
        assert_eq!(config.api_version(), &ApiVersion::V2026_04);
        assert_eq!(config.scopes().to_string(), "read_orders,read_products");
    }

    #[test]
    fn test_from_lookup_reports_missing_variable() {
        let result = ConnectConfig::from_lookup(|name| match name {
            "SHOPIFY_API_KEY" => Some("key".to_string()),
            _ => None,
        });

        assert_eq!(
            result.unwrap_err(),
            ConfigError::MissingEnvVar {
                name: "SHOPIFY_API_SECRET"
            }
        );
    }
}
