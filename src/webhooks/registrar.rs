//! Webhook subscription after a store connects.

use std::sync::Arc;

use crate::clients::{ProviderClient, ProviderError};
use crate::store::{ConnectionChange, StoreConnection, StoreRegistry};
use crate::webhooks::{RegistrationOutcome, RegistrationReport, WebhookError, WebhookTopic};

/// Subscribes the mandatory compliance topics plus the configured business
/// topics for a connected store.
///
/// Registration and connectivity are separate failure domains: a failed
/// topic is logged and reported, never rolled back into the connection.
#[derive(Clone)]
pub struct WebhookRegistrar {
    provider: ProviderClient,
    registry: Arc<dyn StoreRegistry>,
}

impl std::fmt::Debug for WebhookRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookRegistrar")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

impl WebhookRegistrar {
    /// Creates a registrar writing results back to `registry`.
    #[must_use]
    pub fn new(provider: ProviderClient, registry: Arc<dyn StoreRegistry>) -> Self {
        Self { provider, registry }
    }

    /// Returns the topics subscribed for every connection, mandatory first,
    /// without duplicates.
    #[must_use]
    pub fn topics(&self) -> Vec<WebhookTopic> {
        let mut topics = WebhookTopic::MANDATORY.to_vec();
        for topic in self.provider.config().business_topics() {
            if !topics.contains(topic) {
                topics.push(*topic);
            }
        }
        topics
    }

    /// Subscribes every topic for `connection` and records whether all
    /// mandatory topics are in place.
    ///
    /// One request is made per topic. A 409, or a 422 saying the address is
    /// already taken, counts as [`RegistrationOutcome::AlreadyRegistered`].
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::HostNotConfigured`] if no delivery address can
    /// be built, or [`WebhookError::Store`] if the flag cannot be written.
    pub async fn register_for(
        &self,
        connection: &StoreConnection,
    ) -> Result<RegistrationReport, WebhookError> {
        let config = self.provider.config();
        let host = config.host().ok_or(WebhookError::HostNotConfigured)?;
        let address = format!("{}{}", host.as_ref(), config.webhook_path());
        let shop = &connection.shop;

        let mut results = Vec::new();
        for topic in self.topics() {
            let outcome = match self
                .provider
                .create_webhook(shop, &connection.access_token, topic, &address)
                .await
            {
                Ok(()) => RegistrationOutcome::Created,
                Err(error) if is_already_registered(&error) => {
                    RegistrationOutcome::AlreadyRegistered
                }
                Err(error) => {
                    tracing::warn!(
                        shop = %shop,
                        topic = %topic,
                        status = ?error.status(),
                        "webhook registration failed"
                    );
                    RegistrationOutcome::Failed(WebhookError::WebhookRegistrationFailed {
                        topic,
                        status: error.status(),
                    })
                }
            };
            tracing::debug!(shop = %shop, topic = %topic, outcome = ?outcome, "webhook registration");
            results.push((topic, outcome));
        }

        let report = RegistrationReport { results };
        let registered = report.mandatory_registered();
        if self
            .registry
            .update(shop, ConnectionChange::WebhooksRegistered(registered))
            .await?
            .is_none()
        {
            tracing::debug!(shop = %shop, "connection removed before webhook flag was recorded");
        }

        Ok(report)
    }
}

fn is_already_registered(error: &ProviderError) -> bool {
    match error {
        ProviderError::Status { status: 409, .. } => true,
        ProviderError::Status { status: 422, body } => {
            let body = body.to_ascii_lowercase();
            body.contains("already been taken") || body.contains("already exists")
        }
        _ => false,
    }
}
