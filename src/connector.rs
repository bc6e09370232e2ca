//! The orchestrating facade over the install flow, webhooks and store management.

use std::sync::Arc;

use crate::auth::oauth::{
    begin_auth, validate_auth_callback, AuthQuery, BeginAuthResult, OAuthError, StateStore,
};
use crate::clients::{ProviderClient, ProviderError};
use crate::config::ConnectConfig;
use crate::store::{ReconnectPolicy, StoreConnection, StoreRegistry};
use crate::stores::{RevocationService, StoreManager};
use crate::webhooks::{
    RegistrationReport, WebhookDispatcher, WebhookDispatcherBuilder, WebhookRegistrar,
};

/// Result of [`StoreConnector::complete`].
#[derive(Debug)]
pub struct ConnectResult {
    /// The stored connection, re-read after webhook registration. `None` if
    /// the shop was removed (e.g. by `shop/redact`) while registration ran.
    pub connection: Option<StoreConnection>,
    /// Per-topic registration results, or `None` if registration could not
    /// run at all (no host configured, registry failure).
    pub registration: Option<RegistrationReport>,
}

/// Wires the install flow, webhook registration, dispatch and store
/// management around one configuration and one pair of stores.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use shop_connect::auth::oauth::{AuthQuery, InMemoryStateStore};
/// use shop_connect::store::InMemoryStoreRegistry;
/// use shop_connect::{ConnectConfig, StoreConnector};
///
/// # async fn run(callback: &str) -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConnectConfig::from_env()?;
/// let connector = StoreConnector::new(
///     config,
///     Arc::new(InMemoryStateStore::new()),
///     Arc::new(InMemoryStoreRegistry::new()),
/// )?;
///
/// let begun = connector.begin("demo-store").await?;
/// // Redirect to begun.auth_url; later, on the callback:
/// let query = AuthQuery::parse(callback).ok_or("malformed callback")?;
/// let result = connector.complete(&query).await?;
/// if let Some(connection) = result.connection {
///     println!("{} webhooks ok: {}", connection.shop, connection.webhooks_registered);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct StoreConnector {
    provider: ProviderClient,
    states: Arc<dyn StateStore>,
    registry: Arc<dyn StoreRegistry>,
    registrar: WebhookRegistrar,
    dispatcher: Arc<WebhookDispatcher>,
    manager: StoreManager,
}

impl std::fmt::Debug for StoreConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConnector")
            .field("provider", &self.provider)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

// Verify StoreConnector is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StoreConnector>();
};

impl StoreConnector {
    /// Creates a connector with a default dispatcher (log-only compliance
    /// capabilities, no business handlers).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the HTTP client cannot be built.
    pub fn new(
        config: ConnectConfig,
        states: Arc<dyn StateStore>,
        registry: Arc<dyn StoreRegistry>,
    ) -> Result<Self, ProviderError> {
        let provider = ProviderClient::new(&config)?;
        let dispatcher = WebhookDispatcher::builder(config, Arc::clone(&registry)).build();
        let revocation = RevocationService::new(provider.clone(), Arc::clone(&registry));

        Ok(Self {
            registrar: WebhookRegistrar::new(provider.clone(), Arc::clone(&registry)),
            manager: StoreManager::new(Arc::clone(&registry), revocation),
            dispatcher: Arc::new(dispatcher),
            provider,
            states,
            registry,
        })
    }

    /// Replaces the dispatcher with one configured by `configure`.
    ///
    /// ```rust,ignore
    /// let connector = connector.with_dispatcher(|builder| {
    ///     builder
    ///         .customer_redactor(MyRedactor)
    ///         .handler(WebhookTopic::OrdersCreate, OrderSync)
    /// });
    /// ```
    #[must_use]
    pub fn with_dispatcher(
        mut self,
        configure: impl FnOnce(WebhookDispatcherBuilder) -> WebhookDispatcherBuilder,
    ) -> Self {
        let builder =
            WebhookDispatcher::builder(self.provider.config().clone(), Arc::clone(&self.registry));
        self.dispatcher = Arc::new(configure(builder).build());
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ConnectConfig {
        self.provider.config()
    }

    /// Starts an install for `shop`; see [`begin_auth`].
    ///
    /// # Errors
    ///
    /// See [`begin_auth`].
    pub async fn begin(&self, shop: &str) -> Result<BeginAuthResult, OAuthError> {
        begin_auth(self.provider.config(), self.states.as_ref(), shop, None).await
    }

    /// Completes an install with [`ReconnectPolicy::PreserveConnectedAt`].
    ///
    /// # Errors
    ///
    /// See [`complete_with_policy`](Self::complete_with_policy).
    pub async fn complete(&self, query: &AuthQuery) -> Result<ConnectResult, OAuthError> {
        self.complete_with_policy(query, ReconnectPolicy::default())
            .await
    }

    /// Validates the callback, stores the connection, then registers webhooks.
    ///
    /// Registration problems never fail the install: they are logged and
    /// surface as `webhooks_registered == false` on the returned connection.
    /// The returned connection is what the registry holds afterwards, so a
    /// shop removed concurrently comes back as `None`.
    ///
    /// # Errors
    ///
    /// Any [`OAuthError`] from [`validate_auth_callback`]; nothing is stored
    /// in that case. [`OAuthError::Store`] if the final re-read fails.
    pub async fn complete_with_policy(
        &self,
        query: &AuthQuery,
        policy: ReconnectPolicy,
    ) -> Result<ConnectResult, OAuthError> {
        let stored = validate_auth_callback(
            &self.provider,
            self.states.as_ref(),
            self.registry.as_ref(),
            query,
            policy,
        )
        .await?;

        let registration = match self.registrar.register_for(&stored).await {
            Ok(report) => Some(report),
            Err(error) => {
                tracing::warn!(shop = %stored.shop, error = %error, "webhook registration skipped");
                None
            }
        };

        let connection = self.registry.get(&stored.shop).await?;
        if connection.is_none() {
            tracing::info!(shop = %stored.shop, "connection removed during registration");
        }

        Ok(ConnectResult {
            connection,
            registration,
        })
    }

    /// Returns the webhook dispatcher to call from the webhook endpoint.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<WebhookDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    #[must_use]
    pub const fn registrar(&self) -> &WebhookRegistrar {
        &self.registrar
    }

    /// Returns the store management surface.
    #[must_use]
    pub const fn manager(&self) -> &StoreManager {
        &self.manager
    }
}
