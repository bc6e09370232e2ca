//! Parameters of the OAuth callback request.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Query parameters Shopify appends to the redirect URI after the merchant
/// approves the install.
///
/// Web frameworks can deserialize this straight from the request query; raw
/// query strings can be parsed with [`AuthQuery::parse`]. Parameters other
/// than the known ones are kept in `extra` because they are covered by the
/// `hmac` signature too.
///
/// # Example
///
/// ```rust
/// use shop_connect::auth::oauth::AuthQuery;
///
/// let query = AuthQuery::parse(
///     "code=abc123&hmac=ff&shop=demo-store.myshopify.com&state=n0nce&timestamp=1700000000",
/// )
/// .unwrap();
/// assert_eq!(query.code, "abc123");
/// assert_eq!(
///     query.to_signable_string(),
///     "code=abc123&shop=demo-store.myshopify.com&state=n0nce&timestamp=1700000000"
/// );
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthQuery {
    /// Single-use authorization code.
    pub code: String,
    /// Shop domain as sent by the provider (`<name>.myshopify.com`).
    pub shop: String,
    /// The nonce issued by `begin_auth`.
    pub state: String,
    /// Unix timestamp of the redirect.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Base64 admin host, present for embedded installs.
    #[serde(default)]
    pub host: Option<String>,
    /// Hex HMAC-SHA256 over the remaining parameters.
    #[serde(default)]
    pub hmac: String,
    /// Any additional signed parameters.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl AuthQuery {
    /// Creates a query with the three required parameters and no signature.
    #[must_use]
    pub fn new(code: impl Into<String>, shop: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            shop: shop.into(),
            state: state.into(),
            ..Self::default()
        }
    }

    /// Parses a raw `application/x-www-form-urlencoded` query string.
    ///
    /// Returns `None` when `code`, `shop` or `state` is missing or a value is
    /// not valid percent-encoded UTF-8.
    #[must_use]
    pub fn parse(query: &str) -> Option<Self> {
        let mut parsed = Self::default();
        let (mut code, mut shop, mut state) = (None, None, None);

        for pair in query.trim_start_matches('?').split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key)?;
            let value = decode_component(value)?;
            match key.as_str() {
                "code" => code = Some(value),
                "shop" => shop = Some(value),
                "state" => state = Some(value),
                "timestamp" => parsed.timestamp = Some(value),
                "host" => parsed.host = Some(value),
                "hmac" => parsed.hmac = value,
                _ => {
                    parsed.extra.insert(key, value);
                }
            }
        }

        parsed.code = code?;
        parsed.shop = shop?;
        parsed.state = state?;
        Some(parsed)
    }

    /// Returns the sorted `key=value&...` string the `hmac` was computed over.
    ///
    /// `hmac` and the legacy `signature` parameter are excluded.
    #[must_use]
    pub fn to_signable_string(&self) -> String {
        let mut params: Vec<(&str, &str)> = vec![
            ("code", self.code.as_str()),
            ("shop", self.shop.as_str()),
            ("state", self.state.as_str()),
        ];
        if let Some(timestamp) = &self.timestamp {
            params.push(("timestamp", timestamp));
        }
        if let Some(host) = &self.host {
            params.push(("host", host));
        }
        params.extend(
            self.extra
                .iter()
                .filter(|(key, _)| key.as_str() != "signature")
                .map(|(key, value)| (key.as_str(), value.as_str())),
        );
        params.sort_unstable_by(|a, b| a.0.cmp(b.0));

        params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn decode_component(raw: &str) -> Option<String> {
    urlencoding::decode(&raw.replace('+', " "))
        .ok()
        .map(std::borrow::Cow::into_owned)
}
