//! Store connection data model and repository.
//!
//! - [`StoreConnection`]: one connected shop, including its access token
//! - [`StoreSummary`]: the token-free view handed to clients
//! - [`StoreRegistry`]: the repository every component reads and writes through
//! - [`InMemoryStoreRegistry`]: a process-local registry for tests and
//!   single-instance deployments
//!
//! Persistent backends implement [`StoreRegistry`] and report failures as
//! [`StoreError::Backend`].

mod connection;
mod error;
mod registry;

pub use connection::{
    AccessToken, ConnectionChange, ConnectionStatus, ReconnectPolicy, ShopMetadata,
    StoreConnection, StoreSummary,
};
pub use error::StoreError;
pub use registry::{InMemoryStoreRegistry, StoreRegistry};
