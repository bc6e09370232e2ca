//! # shop-connect
//!
//! The store-connection core of a Shopify app: OAuth install with CSRF state,
//! token exchange and shop metadata, webhook registration, signed webhook
//! verification and dispatch (including the mandatory compliance topics) and
//! store disconnection.
//!
//! ## Overview
//!
//! - Type-safe configuration via [`ConnectConfig`] and [`ConnectConfigBuilder`]
//! - Validated newtypes for credentials and domains
//! - OAuth 2.0 authorization code flow via [`auth::oauth`]
//! - Connection records and the keyed [`store::StoreRegistry`]
//! - Webhook registration, verification and dispatch via [`webhooks`]
//! - Disconnection and the store list via [`stores`]
//! - [`StoreConnector`], which wires all of the above together
//!
//! ## Quick Start
//!
//! ```rust
//! use shop_connect::{ApiKey, ApiSecretKey, ApiVersion, ConnectConfig, HostUrl};
//!
//! let config = ConnectConfig::builder()
//!     .api_key(ApiKey::new("your-api-key").unwrap())
//!     .api_secret_key(ApiSecretKey::new("your-api-secret").unwrap())
//!     .host(HostUrl::new("https://your-app.example.com").unwrap())
//!     .scopes("read_products,read_orders".parse().unwrap())
//!     .api_version(ApiVersion::latest())
//!     .build()
//!     .unwrap();
//! assert_eq!(config.redirect_path(), "/auth/callback");
//! ```
//!
//! ## Storage
//!
//! Storage is abstract: implement [`auth::oauth::StateStore`] and
//! [`store::StoreRegistry`] over your database. The in-memory implementations
//! shipped here suit tests and single-process deployments.
//!
//! ## Design Principles
//!
//! - **No global state**: configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: all newtypes validate on construction
//! - **Thread-safe**: all services are `Send + Sync`
//! - **Async-first**: designed for the Tokio runtime
//! - **No secrets in errors**: tokens, the client secret and provider
//!   response bodies never appear in `Display` output or logs

use std::future::Future;
use std::pin::Pin;

pub mod auth;
pub mod clients;
pub mod config;
pub mod connector;
pub mod error;
pub mod store;
pub mod stores;
pub mod webhooks;

/// Boxed, sendable future returned by the storage and extension traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// Re-export public types at crate root for convenience
pub use auth::AuthScopes;
pub use config::{
    ApiKey, ApiSecretKey, ApiVersion, ConnectConfig, ConnectConfigBuilder, HostUrl, ShopDomain,
};
pub use connector::{ConnectResult, StoreConnector};
pub use error::ConfigError;

// Re-export OAuth types for convenience
pub use auth::oauth::{
    begin_auth, validate_auth_callback, AuthQuery, BeginAuthResult, OAuthError, StateParam,
};
