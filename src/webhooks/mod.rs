//! Webhook subscription, verification and dispatch.
//!
//! # Overview
//!
//! - [`WebhookRegistrar`]: subscribes the mandatory compliance topics and the
//!   configured business topics after a store connects
//! - [`verify_webhook`]: checks the `X-Shopify-Hmac-Sha256` header against the
//!   raw body, with fallback to the rotated secret
//! - [`WebhookDispatcher`]: verifies, deduplicates and routes deliveries to
//!   compliance capabilities and business handlers
//! - [`WebhookError`]: errors, each mapped to the HTTP status to answer with
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shop_connect::store::InMemoryStoreRegistry;
//! use shop_connect::webhooks::{WebhookDispatcher, WebhookRequest};
//! use shop_connect::{ApiKey, ApiSecretKey, ConnectConfig};
//!
//! # async fn example(body: Vec<u8>, headers: Vec<(String, String)>) {
//! let config = ConnectConfig::builder()
//!     .api_key(ApiKey::new("key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("secret").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let dispatcher =
//!     WebhookDispatcher::builder(config, Arc::new(InMemoryStoreRegistry::new())).build();
//!
//! let response = dispatcher
//!     .dispatch(&WebhookRequest::from_headers(body, headers))
//!     .await;
//! println!("answer with {}", response.status_code());
//! # }
//! ```

mod delivery_log;
mod dispatcher;
mod errors;
mod registrar;
mod types;
mod verification;

pub use delivery_log::{DeliveryLog, DEFAULT_DELIVERY_LOG_CAPACITY};
pub use dispatcher::{
    DispatchOutcome, WebhookDispatcher, WebhookDispatcherBuilder, WebhookResponse,
};
pub use errors::WebhookError;
pub use registrar::WebhookRegistrar;
pub use types::{
    ComplianceCustomer, CustomerRedactPayload, CustomerRedactor, DataRequestExporter,
    DataRequestId, DataRequestPayload, HandlerError, LogOnly, RegistrationOutcome,
    RegistrationReport, ShopRedactPayload, ShopRedactor, UnknownTopic, WebhookHandler,
    WebhookTopic,
};
pub use verification::{
    verify_hmac, verify_webhook, WebhookContext, WebhookRequest, HEADER_API_VERSION, HEADER_HMAC,
    HEADER_SHOP_DOMAIN, HEADER_TOPIC, HEADER_WEBHOOK_ID,
};
