//! OAuth 2.0 authorization code grant for store connections.
//!
//! # Flow
//!
//! 1. **Begin** ([`begin_auth`]): validate the shop, store a single-use state
//!    for it, and build the provider authorize URL to redirect the merchant to.
//! 2. **Callback** ([`validate_auth_callback`]): verify the query HMAC, consume
//!    the state, exchange the code for an offline token, fetch shop metadata
//!    and upsert the [`StoreConnection`](crate::store::StoreConnection).
//!
//! # Security
//!
//! - **HMAC validation**: callback queries are verified with HMAC-SHA256 over
//!   the sorted parameters, with fallback to the rotated secret
//! - **CSRF protection**: state is random, bound to one shop, expires after
//!   the configured TTL and is removed on first use
//! - **Constant-time comparison** for signatures and nonces
//! - **Read-only scopes**: requesting any write scope fails before a redirect
//!
//! # Example
//!
//! ```rust,no_run
//! use shop_connect::auth::oauth::{begin_auth, validate_auth_callback, AuthQuery, InMemoryStateStore};
//! use shop_connect::clients::ProviderClient;
//! use shop_connect::store::{InMemoryStoreRegistry, ReconnectPolicy};
//! use shop_connect::{ApiKey, ApiSecretKey, ConnectConfig, HostUrl};
//!
//! # async fn run(raw_callback_query: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectConfig::builder()
//!     .api_key(ApiKey::new("your-api-key")?)
//!     .api_secret_key(ApiSecretKey::new("your-secret")?)
//!     .host(HostUrl::new("https://your-app.example.com")?)
//!     .build()?;
//! let provider = ProviderClient::new(&config)?;
//! let states = InMemoryStateStore::new();
//! let registry = InMemoryStoreRegistry::new();
//!
//! let begun = begin_auth(&config, &states, "demo-store", None).await?;
//! // Redirect the merchant to begun.auth_url ...
//!
//! let query = AuthQuery::parse(raw_callback_query).ok_or("malformed callback")?;
//! let connection =
//!     validate_auth_callback(&provider, &states, &registry, &query, ReconnectPolicy::default())
//!         .await?;
//! println!("connected {}", connection.shop);
//! # Ok(())
//! # }
//! ```

mod auth_query;
mod begin_auth;
mod error;
pub mod hmac;
mod state;
mod state_store;
mod validate_callback;

pub use auth_query::AuthQuery;
pub use begin_auth::{begin_auth, BeginAuthResult};
pub use error::OAuthError;
pub use hmac::{compute_signature, constant_time_compare, validate_hmac};
pub use state::StateParam;
pub use state_store::{consume_state, InMemoryStateStore, OAuthState, StateStore};
pub use validate_callback::validate_auth_callback;
