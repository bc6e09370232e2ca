//! Webhook error types.
//!
//! Each variant maps to the HTTP status the webhook endpoint should return;
//! see [`WebhookError::status_code`].

use thiserror::Error;

use super::types::{HandlerError, WebhookTopic};
use crate::error::status_suffix;
use crate::store::StoreError;

/// Errors raised while registering, verifying or dispatching webhooks.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The signature header is absent or does not match the body.
    #[error("Webhook signature verification failed")]
    SignatureVerificationFailed,

    /// The verified request carried no topic header.
    #[error("Webhook topic header is missing")]
    MissingTopic,

    /// The verified body is not the JSON the topic requires.
    #[error("Webhook payload for '{topic}' could not be parsed")]
    PayloadParseFailed {
        /// Raw topic header.
        topic: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Neither the payload nor the headers name a valid shop.
    #[error("Webhook did not identify a valid shop domain")]
    MissingShopDomain,

    /// A business handler returned an error.
    #[error("Webhook handler for '{topic}' failed")]
    HandlerFailed {
        /// The topic being handled.
        topic: WebhookTopic,
        /// Error returned by the handler.
        #[source]
        source: HandlerError,
    },

    /// Subscribing a topic failed for a reason other than "already exists".
    #[error("Webhook registration for '{topic}' failed{}", status_suffix(.status))]
    WebhookRegistrationFailed {
        /// The topic that failed.
        topic: WebhookTopic,
        /// HTTP status, if a response was received.
        status: Option<u16>,
    },

    /// No host URL is configured, so no delivery address can be built.
    #[error("Host URL is not configured. Please set host in ConnectConfig to register webhooks.")]
    HostNotConfigured,

    /// The store registry failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WebhookError {
    /// Returns the HTTP status the webhook endpoint should answer with.
    ///
    /// 401 for signature failures, 400 for malformed verified requests and 500
    /// for everything that should make the provider redeliver.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::SignatureVerificationFailed => 401,
            Self::MissingTopic | Self::PayloadParseFailed { .. } | Self::MissingShopDomain => 400,
            Self::HandlerFailed { .. }
            | Self::WebhookRegistrationFailed { .. }
            | Self::HostNotConfigured
            | Self::Store(_) => 500,
        }
    }
}

// Verify WebhookError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<WebhookError>();
};
