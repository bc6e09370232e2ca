//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated Shopify API key (the OAuth client id).
///
/// # Example
///
/// ```rust
/// use shop_connect::ApiKey;
///
/// let key = ApiKey::new("my-api-key").unwrap();
/// assert_eq!(key.as_ref(), "my-api-key");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Creates a new validated API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A validated Shopify API secret key (the OAuth client secret).
///
/// The secret signs webhooks and authenticates the token exchange. It stays on
/// the server: `Debug` masks it, and no error or log line includes it.
///
/// # Example
///
/// ```rust
/// use shop_connect::ApiSecretKey;
///
/// let secret = ApiSecretKey::new("my-secret").unwrap();
/// assert_eq!(format!("{:?}", secret), "ApiSecretKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiSecretKey(String);

impl ApiSecretKey {
    /// Creates a new validated API secret key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyApiSecretKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptyApiSecretKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for ApiSecretKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiSecretKey(*****)")
    }
}

/// A validated shop domain, the primary key of every store connection.
///
/// The canonical form is the lowercase shop name (`demo-store`). Input may be
/// given either as the bare name or as the full `demo-store.myshopify.com`
/// host, which is what Shopify sends in webhook headers and callback queries.
///
/// # Rules
///
/// - 3 to 100 characters after normalization
/// - ASCII letters, digits and hyphens only; no leading or trailing hyphen
/// - no scheme (`https://`), path, query or foreign domain suffix
///
/// # Example
///
/// ```rust
/// use shop_connect::ShopDomain;
///
/// let shop = ShopDomain::new("Demo-Store.myshopify.com").unwrap();
/// assert_eq!(shop.as_ref(), "demo-store");
/// assert_eq!(shop.myshopify_domain(), "demo-store.myshopify.com");
///
/// assert!(ShopDomain::new("https://demo-store.myshopify.com").is_err());
/// assert!(ShopDomain::new("demo-store/admin").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShopDomain(String);

impl ShopDomain {
    const SUFFIX: &'static str = ".myshopify.com";
    const MIN_LEN: usize = 3;
    const MAX_LEN: usize = 100;

    /// Creates a new validated shop domain.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidShopDomain`] if the domain is invalid.
    pub fn new(domain: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = domain.into();
        let normalized = raw.trim().to_lowercase();
        let name = normalized
            .strip_suffix(Self::SUFFIX)
            .unwrap_or(&normalized);

        if !Self::is_valid_shop_name(name) {
            return Err(ConfigError::InvalidShopDomain { domain: raw });
        }

        Ok(Self(name.to_string()))
    }

    /// Returns the full `<name>.myshopify.com` host for this shop.
    #[must_use]
    pub fn myshopify_domain(&self) -> String {
        format!("{}{}", self.0, Self::SUFFIX)
    }

    fn is_valid_shop_name(name: &str) -> bool {
        if !(Self::MIN_LEN..=Self::MAX_LEN).contains(&name.len()) {
            return false;
        }

        if name.starts_with('-') || name.ends_with('-') {
            return false;
        }

        name.chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShopDomain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShopDomain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// A validated absolute URL with a scheme and host.
///
/// Used for the application host (redirect and webhook addresses) and for the
/// optional provider base URL override.
///
/// # Example
///
/// ```rust
/// use shop_connect::HostUrl;
///
/// let url = HostUrl::new("https://myapp.example.com/").unwrap();
/// assert_eq!(url.as_ref(), "https://myapp.example.com");
/// assert_eq!(url.host_name(), Some("myapp.example.com"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl HostUrl {
    /// Creates a new validated host URL. A trailing slash is dropped so paths
    /// can be appended directly.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHostUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let url = url.trim().trim_end_matches('/').to_string();

        let scheme_end = url
            .find("://")
            .ok_or_else(|| ConfigError::InvalidHostUrl { url: url.clone() })?;

        let scheme = &url[..scheme_end];
        if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        let host_start = scheme_end + 3;
        let host_end = url[host_start..]
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_start >= host_end {
            return Err(ConfigError::InvalidHostUrl { url });
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL.
    #[must_use]
    pub fn host_name(&self) -> Option<&str> {
        let host = &self.url[self.host_start..self.host_end];
        if host.is_empty() {
            None
        } else {
            Some(host)
        }
    }
}

impl AsRef<str> for HostUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_rejects_empty_string() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::EmptyApiKey)));
        assert!(matches!(ApiKey::new("   "), Err(ConfigError::EmptyApiKey)));
    }

    #[test]
    fn test_api_secret_key_masks_value_in_debug() {
        let secret = ApiSecretKey::new("super-secret-key").unwrap();
        let debug_output = format!("{secret:?}");
        assert_eq!(debug_output, "ApiSecretKey(*****)");
        assert!(!debug_output.contains("super-secret-key"));
    }

    #[test]
    fn test_shop_domain_canonicalizes_full_host() {
        let shop = ShopDomain::new("  ACME-Store.myshopify.com ").unwrap();
        assert_eq!(shop.as_ref(), "acme-store");
        assert_eq!(shop.myshopify_domain(), "acme-store.myshopify.com");
    }

    #[test]
    fn test_shop_domain_accepts_bare_name() {
        let shop = ShopDomain::new("demo-store").unwrap();
        assert_eq!(shop.as_ref(), "demo-store");
        assert_eq!(shop.to_string(), "demo-store");
    }

    #[test]
    fn test_shop_domain_enforces_length_bounds() {
        assert!(ShopDomain::new("ab").is_err());
        assert!(ShopDomain::new("abc").is_ok());
        assert!(ShopDomain::new("a".repeat(100)).is_ok());
        assert!(ShopDomain::new("a".repeat(101)).is_err());
    }

    #[test]
    fn test_shop_domain_rejects_invalid_domains() {
        assert!(ShopDomain::new("").is_err());
        assert!(ShopDomain::new("my store").is_err());
        assert!(ShopDomain::new("my_store").is_err());
        assert!(ShopDomain::new("-my-store").is_err());
        assert!(ShopDomain::new("my-store-").is_err());
        assert!(ShopDomain::new("my-store.otherdomain.com").is_err());
        assert!(ShopDomain::new("https://my-store").is_err());
        assert!(ShopDomain::new("my-store/admin").is_err());
        assert!(ShopDomain::new("my-store?x=1").is_err());
    }

    #[test]
    fn test_shop_domain_invalid_error_keeps_raw_input() {
        let err = ShopDomain::new("evil.com/path").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidShopDomain {
                domain: "evil.com/path".to_string()
            }
        );
    }

    #[test]
    fn test_shop_domain_serde_round_trip_uses_canonical_form() {
        let shop = ShopDomain::new("my-store.myshopify.com").unwrap();
        let json = serde_json::to_string(&shop).unwrap();
        assert_eq!(json, r#""my-store""#);

        let back: ShopDomain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shop);

        let bad: Result<ShopDomain, _> = serde_json::from_str(r#""not a shop""#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_host_url_validates_format() {
        let url = HostUrl::new("http://localhost:3000").unwrap();
        assert_eq!(url.host_name(), Some("localhost"));

        let url = HostUrl::new("https://myapp.example.com/").unwrap();
        assert_eq!(url.as_ref(), "https://myapp.example.com");
    }

    #[test]
    fn test_host_url_rejects_invalid() {
        assert!(HostUrl::new("myapp.example.com").is_err());
        assert!(HostUrl::new("https://").is_err());
        assert!(HostUrl::new("://example.com").is_err());
    }
}
