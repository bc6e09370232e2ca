//! Outbound HTTP to the provider.
//!
//! - [`ProviderClient`]: token exchange, shop metadata, webhook subscription
//!   and token revocation
//! - [`ProviderError`]: status or transport failure of one request

mod errors;
mod provider;

pub use errors::ProviderError;
pub use provider::{
    ProviderClient, TokenGrant, CONNECT_TIMEOUT, HEADER_ACCESS_TOKEN, SDK_VERSION,
};
