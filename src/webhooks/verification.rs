//! Webhook signature verification.
//!
//! Shopify signs every delivery with HMAC-SHA256 over the raw request body,
//! keyed with the app's API secret, and sends the base64 digest in
//! `X-Shopify-Hmac-SHA256`. Verification must run on the exact received bytes,
//! before the body is parsed.
//!
//! # Example
//!
//! ```rust
//! use shop_connect::{ApiKey, ApiSecretKey, ConnectConfig};
//! use shop_connect::auth::oauth::hmac::compute_signature_base64;
//! use shop_connect::webhooks::{verify_webhook, WebhookRequest};
//!
//! let config = ConnectConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let body = br#"{"shop_domain":"acme.myshopify.com"}"#.to_vec();
//! let signature = compute_signature_base64(&body, "secret");
//! let request = WebhookRequest::new(
//!     body,
//!     Some(signature),
//!     Some("shop/redact".to_string()),
//!     Some("acme.myshopify.com".to_string()),
//!     None,
//!     None,
//! );
//!
//! let context = verify_webhook(&config, &request).unwrap();
//! assert_eq!(context.topic_raw(), "shop/redact");
//! ```

use chrono::{DateTime, Utc};

use crate::auth::oauth::hmac::{compute_signature_base64, constant_time_compare, verify_with_rotation};
use crate::config::ConnectConfig;
use crate::webhooks::{WebhookError, WebhookTopic};

// ============================================================================
// Header Constants
// ============================================================================

/// Base64 HMAC-SHA256 of the raw body.
pub const HEADER_HMAC: &str = "X-Shopify-Hmac-SHA256";

/// Topic name, e.g. `orders/create`.
pub const HEADER_TOPIC: &str = "X-Shopify-Topic";

/// `<name>.myshopify.com` of the sending shop.
pub const HEADER_SHOP_DOMAIN: &str = "X-Shopify-Shop-Domain";

/// Admin API version the payload was rendered with.
pub const HEADER_API_VERSION: &str = "X-Shopify-API-Version";

/// Unique delivery id, stable across redeliveries.
pub const HEADER_WEBHOOK_ID: &str = "X-Shopify-Webhook-Id";

// ============================================================================
// WebhookRequest
// ============================================================================

/// An inbound webhook delivery as received: raw body bytes and header values.
#[derive(Debug, Clone)]
pub struct WebhookRequest {
    body: Vec<u8>,
    hmac_header: Option<String>,
    topic: Option<String>,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
    received_at: DateTime<Utc>,
}

impl WebhookRequest {
    /// Creates a request from the body and the individual header values.
    #[must_use]
    pub fn new(
        body: Vec<u8>,
        hmac_header: Option<String>,
        topic: Option<String>,
        shop_domain: Option<String>,
        api_version: Option<String>,
        webhook_id: Option<String>,
    ) -> Self {
        Self {
            body,
            hmac_header,
            topic,
            shop_domain,
            api_version,
            webhook_id,
            received_at: Utc::now(),
        }
    }

    /// Creates a request from the body and a list of headers.
    ///
    /// Header names are matched case-insensitively; unrelated headers are
    /// ignored.
    #[must_use]
    pub fn from_headers<K, V>(body: Vec<u8>, headers: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut request = Self::new(body, None, None, None, None, None);
        for (name, value) in headers {
            let name = name.as_ref();
            let slot = if name.eq_ignore_ascii_case(HEADER_HMAC) {
                &mut request.hmac_header
            } else if name.eq_ignore_ascii_case(HEADER_TOPIC) {
                &mut request.topic
            } else if name.eq_ignore_ascii_case(HEADER_SHOP_DOMAIN) {
                &mut request.shop_domain
            } else if name.eq_ignore_ascii_case(HEADER_API_VERSION) {
                &mut request.api_version
            } else if name.eq_ignore_ascii_case(HEADER_WEBHOOK_ID) {
                &mut request.webhook_id
            } else {
                continue;
            };
            *slot = Some(value.into());
        }
        request
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn hmac_header(&self) -> Option<&str> {
        self.hmac_header.as_deref()
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }

    /// When this request object was created.
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

// ============================================================================
// WebhookContext
// ============================================================================

/// Header metadata of a delivery whose signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookContext {
    topic: Option<WebhookTopic>,
    topic_raw: String,
    shop_domain: Option<String>,
    api_version: Option<String>,
    webhook_id: Option<String>,
    received_at: DateTime<Utc>,
}

impl WebhookContext {
    /// Returns the parsed topic, or `None` for topics this crate does not know.
    #[must_use]
    pub const fn topic(&self) -> Option<WebhookTopic> {
        self.topic
    }

    /// Returns the topic header as received (empty if absent).
    #[must_use]
    pub fn topic_raw(&self) -> &str {
        &self.topic_raw
    }

    #[must_use]
    pub fn shop_domain(&self) -> Option<&str> {
        self.shop_domain.as_deref()
    }

    #[must_use]
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    #[must_use]
    pub fn webhook_id(&self) -> Option<&str> {
        self.webhook_id.as_deref()
    }

    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

// ============================================================================
// Verification Functions
// ============================================================================

/// Checks `hmac_header` against the base64 HMAC-SHA256 of `raw_body`.
#[must_use]
pub fn verify_hmac(raw_body: &[u8], hmac_header: &str, secret: &str) -> bool {
    constant_time_compare(&compute_signature_base64(raw_body, secret), hmac_header)
}

/// Verifies a delivery's signature and returns its header context.
///
/// The header value is compared verbatim. A `sha256=` prefix is not stripped:
/// Shopify sends the bare base64 digest.
///
/// # Errors
///
/// Returns [`WebhookError::SignatureVerificationFailed`] if the signature
/// header is absent or empty (no digest is computed), or if it matches
/// neither the primary nor the rotated secret.
pub fn verify_webhook(
    config: &ConnectConfig,
    request: &WebhookRequest,
) -> Result<WebhookContext, WebhookError> {
    let hmac_header = request
        .hmac_header()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(WebhookError::SignatureVerificationFailed)?;

    let body = request.body();
    if !verify_with_rotation(config, hmac_header, |secret| {
        compute_signature_base64(body, secret)
    }) {
        return Err(WebhookError::SignatureVerificationFailed);
    }

    let topic_raw = request.topic().unwrap_or("").trim().to_string();
    let topic = topic_raw.parse().ok();

    Ok(WebhookContext {
        topic,
        topic_raw,
        shop_domain: request.shop_domain().map(String::from),
        api_version: request.api_version().map(String::from),
        webhook_id: request.webhook_id().map(String::from),
        received_at: request.received_at(),
    })
}
