//! Connection records and their client-facing view.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthScopes;
use crate::config::ShopDomain;

/// An offline Admin API access token.
///
/// Deliberately not `Serialize`; `Debug` is masked.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a token returned by the provider.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl AsRef<str> for AccessToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(*****)")
    }
}

/// Public shop details fetched right after the token exchange.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopMetadata {
    /// Store name.
    pub name: String,
    /// Store contact email.
    pub email: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// IANA timezone name.
    pub timezone: String,
    /// Subscription plan name.
    pub plan_name: String,
}

/// Lifecycle state of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// The token is believed valid.
    Connected,
    /// The app was uninstalled; the token no longer works.
    Revoked,
}

/// What to do with `connected_at` when a shop connects again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Keep the original connection time.
    #[default]
    PreserveConnectedAt,
    /// Treat the reconnect as a fresh connection.
    ResetConnectedAt,
}

/// A single-field mutation applied atomically by
/// [`StoreRegistry::update`](super::StoreRegistry::update).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionChange {
    /// Sets `webhooks_registered`.
    WebhooksRegistered(bool),
    /// Sets `status`.
    Status(ConnectionStatus),
}

/// A connected store, keyed by its shop domain.
///
/// Only created from a successful token exchange and metadata fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConnection {
    /// The shop this connection belongs to; the registry key.
    pub shop: ShopDomain,
    /// Offline access token from the code exchange.
    pub access_token: AccessToken,
    /// Scopes the merchant actually granted.
    pub granted_scopes: AuthScopes,
    /// Shop details fetched at connect time.
    pub metadata: ShopMetadata,
    /// When the shop first connected (or last reconnected with a reset).
    pub connected_at: DateTime<Utc>,
    /// When this record last changed.
    pub updated_at: DateTime<Utc>,
    /// `true` only when every mandatory compliance topic is registered.
    pub webhooks_registered: bool,
    /// Whether the token is still believed valid.
    pub status: ConnectionStatus,
}

impl StoreConnection {
    /// Creates a freshly connected record stamped with the current time.
    #[must_use]
    pub fn new(
        shop: ShopDomain,
        access_token: AccessToken,
        granted_scopes: AuthScopes,
        metadata: ShopMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            shop,
            access_token,
            granted_scopes,
            metadata,
            connected_at: now,
            updated_at: now,
            webhooks_registered: false,
            status: ConnectionStatus::Connected,
        }
    }

    /// Merges a new connection for the same shop over `existing`.
    ///
    /// Token, scopes and metadata come from `self`. `connected_at` is kept from
    /// `existing` unless `policy` resets it. The webhook flag survives only if
    /// the existing record was still connected.
    #[must_use]
    pub fn reconnect_over(mut self, existing: &Self, policy: ReconnectPolicy) -> Self {
        if policy == ReconnectPolicy::PreserveConnectedAt {
            self.connected_at = existing.connected_at;
        }
        if existing.status == ConnectionStatus::Connected {
            self.webhooks_registered = self.webhooks_registered || existing.webhooks_registered;
        }
        self.status = ConnectionStatus::Connected;
        self
    }

    /// Applies `change` and bumps `updated_at`.
    pub fn apply(&mut self, change: ConnectionChange) {
        match change {
            ConnectionChange::WebhooksRegistered(registered) => {
                self.webhooks_registered = registered;
            }
            ConnectionChange::Status(status) => self.status = status,
        }
        self.updated_at = Utc::now();
    }

    /// Returns the token-free view of this connection.
    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            shop: self.shop.clone(),
            metadata: self.metadata.clone(),
            granted_scopes: self.granted_scopes.clone(),
            connected_at: self.connected_at,
            updated_at: self.updated_at,
            webhooks_registered: self.webhooks_registered,
            status: self.status,
        }
    }
}

/// Client-facing view of a [`StoreConnection`]; carries no access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// The connected shop.
    pub shop: ShopDomain,
    /// Shop details fetched at connect time.
    pub metadata: ShopMetadata,
    /// Scopes the merchant granted.
    pub granted_scopes: AuthScopes,
    /// When the shop first connected.
    pub connected_at: DateTime<Utc>,
    /// When the connection last changed.
    pub updated_at: DateTime<Utc>,
    /// `true` only when every mandatory compliance topic is registered.
    pub webhooks_registered: bool,
    /// Lifecycle state of the connection.
    pub status: ConnectionStatus,
}

impl From<&StoreConnection> for StoreSummary {
    fn from(connection: &StoreConnection) -> Self {
        connection.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(token: &str) -> StoreConnection {
        StoreConnection::new(
            ShopDomain::new("demo-store").unwrap(),
            AccessToken::new(token),
            "read_products".parse().unwrap(),
            ShopMetadata {
                name: "Demo Store".to_string(),
                email: "owner@demo.example".to_string(),
                currency: "USD".to_string(),
                timezone: "America/New_York".to_string(),
                plan_name: "basic".to_string(),
            },
        )
    }

    #[test]
    fn test_access_token_debug_is_masked() {
        let conn = connection("shpat_secret");
        let debug = format!("{conn:?}");
        assert!(debug.contains("AccessToken(*****)"));
        assert!(!debug.contains("shpat_secret"));
    }

    #[test]
    fn test_summary_json_has_no_token() {
        let conn = connection("shpat_secret");
        let json = serde_json::to_value(conn.summary()).unwrap();

        assert_eq!(json["shop"], "demo-store");
        assert_eq!(json["metadata"]["currency"], "USD");
        assert_eq!(json["granted_scopes"], "read_products");
        assert_eq!(json["status"], "connected");
        assert!(json.get("access_token").is_none());
        assert!(!json.to_string().contains("shpat_secret"));
    }

    #[test]
    fn test_reconnect_preserves_connected_at_by_default() {
        let mut existing = connection("tok_old");
        existing.connected_at = Utc::now() - chrono::Duration::days(30);
        existing.webhooks_registered = true;

        let merged = connection("tok_new").reconnect_over(&existing, ReconnectPolicy::default());

        assert_eq!(merged.connected_at, existing.connected_at);
        assert_eq!(merged.access_token.as_ref(), "tok_new");
        assert!(merged.webhooks_registered);
    }

    #[test]
    fn test_reconnect_can_reset_connected_at() {
        let mut existing = connection("tok_old");
        existing.connected_at = Utc::now() - chrono::Duration::days(30);

        let incoming = connection("tok_new");
        let merged = incoming
            .clone()
            .reconnect_over(&existing, ReconnectPolicy::ResetConnectedAt);

        assert_eq!(merged.connected_at, incoming.connected_at);
    }

    #[test]
    fn test_reconnect_after_revocation_clears_webhook_flag() {
        let mut existing = connection("tok_old");
        existing.webhooks_registered = true;
        existing.status = ConnectionStatus::Revoked;

        let merged = connection("tok_new").reconnect_over(&existing, ReconnectPolicy::default());

        assert!(!merged.webhooks_registered);
        assert_eq!(merged.status, ConnectionStatus::Connected);
    }

    #[test]
    fn test_apply_updates_single_field() {
        let mut conn = connection("tok");
        conn.apply(ConnectionChange::WebhooksRegistered(true));
        conn.apply(ConnectionChange::Status(ConnectionStatus::Revoked));

        assert!(conn.webhooks_registered);
        assert_eq!(conn.status, ConnectionStatus::Revoked);
        assert!(conn.updated_at >= conn.connected_at);
    }
}
