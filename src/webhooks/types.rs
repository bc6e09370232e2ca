//! Topics, payloads and extension traits for webhook handling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::WebhookError;
use crate::webhooks::verification::WebhookContext;
use crate::BoxFuture;

/// Error type returned by application-supplied handlers and capabilities.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Webhook topics the connection core subscribes to and routes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    /// Customer asked for their stored data.
    #[serde(rename = "customers/data_request")]
    CustomersDataRequest,
    /// Customer data must be erased.
    #[serde(rename = "customers/redact")]
    CustomersRedact,
    /// Shop data must be erased, 48 hours after uninstall.
    #[serde(rename = "shop/redact")]
    ShopRedact,
    #[serde(rename = "orders/create")]
    OrdersCreate,
    #[serde(rename = "products/update")]
    ProductsUpdate,
    #[serde(rename = "app/uninstalled")]
    AppUninstalled,
}

impl WebhookTopic {
    /// Compliance topics every connection must subscribe to.
    pub const MANDATORY: &'static [Self] = &[
        Self::CustomersDataRequest,
        Self::CustomersRedact,
        Self::ShopRedact,
    ];

    /// Default optional business topics.
    pub const BUSINESS: &'static [Self] =
        &[Self::OrdersCreate, Self::ProductsUpdate, Self::AppUninstalled];

    /// Returns the wire name, e.g. `orders/create`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
            Self::OrdersCreate => "orders/create",
            Self::ProductsUpdate => "products/update",
            Self::AppUninstalled => "app/uninstalled",
        }
    }

    /// Returns `true` for the compliance topics.
    #[must_use]
    pub fn is_mandatory(self) -> bool {
        Self::MANDATORY.contains(&self)
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a topic name is not one of [`WebhookTopic`]'s variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownTopic(pub String);

impl fmt::Display for UnknownTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown webhook topic '{}'", self.0)
    }
}

impl std::error::Error for UnknownTopic {}

impl FromStr for WebhookTopic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::MANDATORY, Self::BUSINESS]
            .concat()
            .into_iter()
            .find(|topic| topic.as_str() == s.trim())
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

// ============================================================================
// Compliance payloads
// ============================================================================

/// Customer reference in compliance payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceCustomer {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Identifier of a data request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequestId {
    pub id: u64,
}

/// Body of a `customers/data_request` delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRequestPayload {
    pub shop_id: u64,
    pub shop_domain: String,
    #[serde(default)]
    pub orders_requested: Vec<u64>,
    pub customer: ComplianceCustomer,
    #[serde(default)]
    pub data_request: Option<DataRequestId>,
}

/// Body of a `customers/redact` delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRedactPayload {
    pub shop_id: u64,
    pub shop_domain: String,
    pub customer: ComplianceCustomer,
    #[serde(default)]
    pub orders_to_redact: Vec<u64>,
}

/// Body of a `shop/redact` delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopRedactPayload {
    #[serde(default)]
    pub shop_id: Option<u64>,
    #[serde(default)]
    pub shop_domain: Option<String>,
}

// ============================================================================
// Capabilities and handlers
// ============================================================================

/// Collects and delivers a customer's data after a `customers/data_request`.
///
/// Invoked on a spawned task after the delivery was acknowledged. May be
/// invoked more than once for the same request.
///
/// By the time this runs the delivery has been answered 200 and recorded, so
/// the provider will not redeliver it. An `Err` is only logged. Implementations
/// must persist the work durably themselves (a queue or retried job) before
/// returning.
pub trait DataRequestExporter: Send + Sync + 'static {
    fn export(&self, request: DataRequestPayload) -> BoxFuture<'_, Result<(), HandlerError>>;
}

/// Erases or anonymizes a customer's data after a `customers/redact`.
///
/// Invoked on a spawned task after the delivery was acknowledged. Must be
/// safe to run more than once for the same customer.
///
/// By the time this runs the delivery has been answered 200 and recorded, so
/// the provider will not redeliver it. An `Err` is only logged. Implementations
/// must persist the work durably themselves (a queue or retried job) before
/// returning.
pub trait CustomerRedactor: Send + Sync + 'static {
    fn redact(&self, request: CustomerRedactPayload) -> BoxFuture<'_, Result<(), HandlerError>>;
}

/// Erases application data held for a shop after `shop/redact`, beyond the
/// connection record the dispatcher removes itself.
///
/// By the time this runs the delivery has been answered 200 and recorded, so
/// the provider will not redeliver it. An `Err` is only logged. Implementations
/// must persist the work durably themselves (a queue or retried job) before
/// returning.
pub trait ShopRedactor: Send + Sync + 'static {
    fn redact_shop(&self, request: ShopRedactPayload) -> BoxFuture<'_, Result<(), HandlerError>>;
}

/// Handler for a business topic, invoked inline before the response.
///
/// Returning `Err` makes the dispatcher answer 500 so the provider redelivers;
/// implementations must therefore be idempotent.
///
/// # Example
///
/// ```rust
/// use shop_connect::webhooks::{HandlerError, WebhookContext, WebhookHandler};
/// use shop_connect::BoxFuture;
///
/// struct OrderLogger;
///
/// impl WebhookHandler for OrderLogger {
///     fn handle<'a>(
///         &'a self,
///         context: &'a WebhookContext,
///         payload: &'a serde_json::Value,
///     ) -> BoxFuture<'a, Result<(), HandlerError>> {
///         Box::pin(async move {
///             println!("{:?} order {}", context.shop_domain(), payload["id"]);
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait WebhookHandler: Send + Sync {
    fn handle<'a>(
        &'a self,
        context: &'a WebhookContext,
        payload: &'a serde_json::Value,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// Capability used when the application supplies none: logs and succeeds.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogOnly;

impl DataRequestExporter for LogOnly {
    fn export(&self, request: DataRequestPayload) -> BoxFuture<'_, Result<(), HandlerError>> {
        Box::pin(async move {
            tracing::info!(
                shop = %request.shop_domain,
                request_id = ?request.data_request.map(|r| r.id),
                "customer data request received, no exporter configured"
            );
            Ok(())
        })
    }
}

impl CustomerRedactor for LogOnly {
    fn redact(&self, request: CustomerRedactPayload) -> BoxFuture<'_, Result<(), HandlerError>> {
        Box::pin(async move {
            tracing::info!(
                shop = %request.shop_domain,
                customer_id = ?request.customer.id,
                "customer redaction received, no redactor configured"
            );
            Ok(())
        })
    }
}

// ============================================================================
// Registration results
// ============================================================================

/// Outcome of subscribing one topic.
#[derive(Debug)]
pub enum RegistrationOutcome {
    /// The subscription was created.
    Created,
    /// The provider reported the subscription already exists.
    AlreadyRegistered,
    /// Any other failure.
    Failed(WebhookError),
}

impl RegistrationOutcome {
    /// Returns `true` for `Created` and `AlreadyRegistered`.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyRegistered)
    }
}

/// Per-topic results of one registration pass.
#[derive(Debug)]
pub struct RegistrationReport {
    pub results: Vec<(WebhookTopic, RegistrationOutcome)>,
}

impl RegistrationReport {
    /// Returns the outcome recorded for `topic`.
    #[must_use]
    pub fn outcome(&self, topic: WebhookTopic) -> Option<&RegistrationOutcome> {
        self.results
            .iter()
            .find(|(t, _)| *t == topic)
            .map(|(_, outcome)| outcome)
    }

    /// Returns `true` if every mandatory topic is subscribed.
    #[must_use]
    pub fn mandatory_registered(&self) -> bool {
        WebhookTopic::MANDATORY
            .iter()
            .all(|topic| self.outcome(*topic).is_some_and(RegistrationOutcome::is_ok))
    }
}
