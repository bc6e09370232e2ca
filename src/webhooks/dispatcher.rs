//! Verified routing of inbound webhook deliveries.

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::{ConnectConfig, ShopDomain};
use crate::store::{ConnectionChange, ConnectionStatus, StoreRegistry};
use crate::webhooks::delivery_log::{DeliveryLog, DEFAULT_DELIVERY_LOG_CAPACITY};
use crate::webhooks::types::{
    CustomerRedactPayload, CustomerRedactor, DataRequestExporter, DataRequestPayload, LogOnly,
    ShopRedactPayload, ShopRedactor, WebhookHandler,
};
use crate::webhooks::verification::{verify_webhook, WebhookContext, WebhookRequest};
use crate::webhooks::{WebhookError, WebhookTopic};

/// What the dispatcher did with an accepted delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A business handler ran to completion.
    Handled,
    /// A compliance capability was started on a background task.
    Deferred,
    /// `shop/redact` processed; `removed` is `false` if nothing was stored.
    ShopRedacted {
        removed: bool,
    },
    /// `app/uninstalled` processed; `found` is `false` if nothing was stored.
    Uninstalled {
        found: bool,
    },
    /// The delivery id was already processed.
    Duplicate,
    /// Verified, but no handler is configured for the topic.
    Unrouted,
}

/// Result of [`WebhookDispatcher::dispatch`], convertible to an HTTP status.
#[derive(Debug)]
pub enum WebhookResponse {
    /// Answer 200.
    Accepted(DispatchOutcome),
    /// Answer [`WebhookError::status_code`].
    Rejected(WebhookError),
}

impl WebhookResponse {
    /// Returns the HTTP status to send back: 200, 400, 401 or 500.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Accepted(_) => 200,
            Self::Rejected(error) => error.status_code(),
        }
    }

    /// Returns the outcome of an accepted delivery.
    #[must_use]
    pub const fn outcome(&self) -> Option<DispatchOutcome> {
        match self {
            Self::Accepted(outcome) => Some(*outcome),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the error of a rejected delivery.
    #[must_use]
    pub const fn error(&self) -> Option<&WebhookError> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(error) => Some(error),
        }
    }
}

/// Verifies and routes webhook deliveries.
///
/// # Routing
///
/// | Topic | Behavior |
/// |---|---|
/// | `customers/data_request` | spawn [`DataRequestExporter`], answer 200 |
/// | `customers/redact` | spawn [`CustomerRedactor`], answer 200 |
/// | `shop/redact` | remove the connection (idempotent), spawn optional [`ShopRedactor`] |
/// | `app/uninstalled` | mark the connection revoked, then run its handler if any |
/// | business topics | run the registered [`WebhookHandler`] inline |
/// | anything else | answer 200 without processing |
///
/// Nothing happens before the signature verifies.
pub struct WebhookDispatcher {
    config: ConnectConfig,
    registry: Arc<dyn StoreRegistry>,
    exporter: Arc<dyn DataRequestExporter>,
    customer_redactor: Arc<dyn CustomerRedactor>,
    shop_redactor: Option<Arc<dyn ShopRedactor>>,
    handlers: HashMap<WebhookTopic, Arc<dyn WebhookHandler>>,
    deliveries: DeliveryLog,
}

// Implement Debug manually since trait objects don't implement Debug
impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("handlers", &format!("<{} handlers>", self.handlers.len()))
            .field("shop_redactor", &self.shop_redactor.is_some())
            .field("deliveries", &self.deliveries)
            .finish_non_exhaustive()
    }
}

// Verify WebhookDispatcher is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookDispatcher>();
};

impl WebhookDispatcher {
    /// Starts building a dispatcher over `registry`.
    #[must_use]
    pub fn builder(
        config: ConnectConfig,
        registry: Arc<dyn StoreRegistry>,
    ) -> WebhookDispatcherBuilder {
        WebhookDispatcherBuilder {
            config,
            registry,
            exporter: None,
            customer_redactor: None,
            shop_redactor: None,
            handlers: HashMap::new(),
            delivery_log_capacity: DEFAULT_DELIVERY_LOG_CAPACITY,
        }
    }

    /// Verifies, parses and routes one delivery.
    ///
    /// Never panics and never returns early with a partially applied effect:
    /// the returned [`WebhookResponse`] says which status to answer with.
    pub async fn dispatch(&self, request: &WebhookRequest) -> WebhookResponse {
        match self.process(request).await {
            Ok(outcome) => WebhookResponse::Accepted(outcome),
            Err(error) => WebhookResponse::Rejected(error),
        }
    }

    async fn process(&self, request: &WebhookRequest) -> Result<DispatchOutcome, WebhookError> {
        let context = verify_webhook(&self.config, request).map_err(|error| {
            tracing::warn!(
                shop = ?request.shop_domain(),
                topic = ?request.topic(),
                "webhook signature verification failed"
            );
            error
        })?;

        if context.topic_raw().is_empty() {
            return Err(WebhookError::MissingTopic);
        }

        if let Some(id) = context.webhook_id() {
            if self.deliveries.contains(id) {
                tracing::debug!(webhook_id = id, topic = context.topic_raw(), "duplicate delivery");
                return Ok(DispatchOutcome::Duplicate);
            }
        }

        let outcome = self.route(&context, request.body()).await?;

        if let Some(id) = context.webhook_id() {
            self.deliveries.record(id);
        }
        Ok(outcome)
    }

    /// Picks the route from the topic header alone; the body is only parsed
    /// once a route exists.
    async fn route(
        &self,
        context: &WebhookContext,
        body: &[u8],
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(topic) = context.topic() else {
            tracing::info!(topic = context.topic_raw(), "no route for webhook topic");
            return Ok(DispatchOutcome::Unrouted);
        };

        match topic {
            WebhookTopic::CustomersDataRequest => {
                let request: DataRequestPayload = parse_payload(context, body)?;
                let exporter = Arc::clone(&self.exporter);
                tokio::spawn(async move {
                    let shop = request.shop_domain.clone();
                    if let Err(error) = exporter.export(request).await {
                        tracing::error!(shop = %shop, error = %error, "customer data export failed");
                    }
                });
                Ok(DispatchOutcome::Deferred)
            }
            WebhookTopic::CustomersRedact => {
                let request: CustomerRedactPayload = parse_payload(context, body)?;
                let redactor = Arc::clone(&self.customer_redactor);
                tokio::spawn(async move {
                    let shop = request.shop_domain.clone();
                    if let Err(error) = redactor.redact(request).await {
                        tracing::error!(shop = %shop, error = %error, "customer redaction failed");
                    }
                });
                Ok(DispatchOutcome::Deferred)
            }
            WebhookTopic::ShopRedact => self.redact_shop(context, body).await,
            WebhookTopic::AppUninstalled => self.uninstall(context, body).await,
            WebhookTopic::OrdersCreate | WebhookTopic::ProductsUpdate => {
                if !self.handlers.contains_key(&topic) {
                    tracing::debug!(topic = %topic, "no handler registered");
                    return Ok(DispatchOutcome::Unrouted);
                }
                let payload: Value = parse_payload(context, body)?;
                self.run_handler(topic, context, &payload).await
            }
        }
    }

    async fn redact_shop(
        &self,
        context: &WebhookContext,
        body: &[u8],
    ) -> Result<DispatchOutcome, WebhookError> {
        let request: ShopRedactPayload = parse_payload(context, body)?;
        let shop = resolve_shop(request.shop_domain.as_deref(), context)?;

        let removed = self.registry.remove(&shop).await?.is_some();
        tracing::info!(shop = %shop, removed, "shop redacted");

        if let Some(redactor) = &self.shop_redactor {
            let redactor = Arc::clone(redactor);
            tokio::spawn(async move {
                if let Err(error) = redactor.redact_shop(request).await {
                    tracing::error!(shop = %shop, error = %error, "shop data redaction failed");
                }
            });
        }

        Ok(DispatchOutcome::ShopRedacted { removed })
    }

    async fn uninstall(
        &self,
        context: &WebhookContext,
        body: &[u8],
    ) -> Result<DispatchOutcome, WebhookError> {
        let payload: Value = parse_payload(context, body)?;
        let from_payload = payload.get("myshopify_domain").and_then(Value::as_str);
        let shop = context
            .shop_domain()
            .and_then(|domain| ShopDomain::new(domain).ok())
            .or_else(|| from_payload.and_then(|domain| ShopDomain::new(domain).ok()))
            .ok_or(WebhookError::MissingShopDomain)?;

        let found = self
            .registry
            .update(&shop, ConnectionChange::Status(ConnectionStatus::Revoked))
            .await?
            .is_some();
        tracing::info!(shop = %shop, found, "app uninstalled, connection revoked");

        if self.handlers.contains_key(&WebhookTopic::AppUninstalled) {
            self.run_handler(WebhookTopic::AppUninstalled, context, &payload)
                .await?;
        }
        Ok(DispatchOutcome::Uninstalled { found })
    }

    async fn run_handler(
        &self,
        topic: WebhookTopic,
        context: &WebhookContext,
        payload: &Value,
    ) -> Result<DispatchOutcome, WebhookError> {
        let Some(handler) = self.handlers.get(&topic) else {
            tracing::debug!(topic = %topic, "no handler registered");
            return Ok(DispatchOutcome::Unrouted);
        };

        handler.handle(context, payload).await.map_err(|source| {
            tracing::warn!(
                shop = ?context.shop_domain(),
                topic = %topic,
                error = %source,
                "webhook handler failed"
            );
            WebhookError::HandlerFailed { topic, source }
        })?;
        Ok(DispatchOutcome::Handled)
    }
}

fn parse_payload<T: DeserializeOwned>(
    context: &WebhookContext,
    body: &[u8],
) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|source| WebhookError::PayloadParseFailed {
        topic: context.topic_raw().to_string(),
        source,
    })
}

/// Picks the shop from the verified payload, falling back to the header.
fn resolve_shop(
    payload_domain: Option<&str>,
    context: &WebhookContext,
) -> Result<ShopDomain, WebhookError> {
    payload_domain
        .or_else(|| context.shop_domain())
        .and_then(|domain| ShopDomain::new(domain).ok())
        .ok_or(WebhookError::MissingShopDomain)
}

/// Builder for [`WebhookDispatcher`].
///
/// Capabilities not supplied default to [`LogOnly`], which logs the request
/// and succeeds.
pub struct WebhookDispatcherBuilder {
    config: ConnectConfig,
    registry: Arc<dyn StoreRegistry>,
    exporter: Option<Arc<dyn DataRequestExporter>>,
    customer_redactor: Option<Arc<dyn CustomerRedactor>>,
    shop_redactor: Option<Arc<dyn ShopRedactor>>,
    handlers: HashMap<WebhookTopic, Arc<dyn WebhookHandler>>,
    delivery_log_capacity: usize,
}

impl std::fmt::Debug for WebhookDispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcherBuilder")
            .field("handlers", &format!("<{} handlers>", self.handlers.len()))
            .field("delivery_log_capacity", &self.delivery_log_capacity)
            .finish_non_exhaustive()
    }
}

impl WebhookDispatcherBuilder {
    /// Sets the capability run for `customers/data_request`.
    #[must_use]
    pub fn data_request_exporter(mut self, exporter: impl DataRequestExporter) -> Self {
        self.exporter = Some(Arc::new(exporter));
        self
    }

    /// Sets the capability run for `customers/redact`.
    #[must_use]
    pub fn customer_redactor(mut self, redactor: impl CustomerRedactor) -> Self {
        self.customer_redactor = Some(Arc::new(redactor));
        self
    }

    /// Sets the capability run after `shop/redact` removed the connection.
    #[must_use]
    pub fn shop_redactor(mut self, redactor: impl ShopRedactor) -> Self {
        self.shop_redactor = Some(Arc::new(redactor));
        self
    }

    /// Registers the handler for a business topic or `app/uninstalled`.
    ///
    /// Handlers for compliance topics are ignored; those topics go through
    /// the capabilities above.
    #[must_use]
    pub fn handler(mut self, topic: WebhookTopic, handler: impl WebhookHandler + 'static) -> Self {
        if topic.is_mandatory() {
            tracing::warn!(topic = %topic, "ignoring handler for compliance topic");
            return self;
        }
        self.handlers.insert(topic, Arc::new(handler));
        self
    }

    /// Sets how many delivery ids are remembered for deduplication.
    #[must_use]
    pub const fn delivery_log_capacity(mut self, capacity: usize) -> Self {
        self.delivery_log_capacity = capacity;
        self
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> WebhookDispatcher {
        WebhookDispatcher {
            config: self.config,
            registry: self.registry,
            exporter: self.exporter.unwrap_or_else(|| Arc::new(LogOnly)),
            customer_redactor: self.customer_redactor.unwrap_or_else(|| Arc::new(LogOnly)),
            shop_redactor: self.shop_redactor,
            handlers: self.handlers,
            deliveries: DeliveryLog::new(self.delivery_log_capacity),
        }
    }
}
