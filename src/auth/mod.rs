//! Authentication for store connections.
//!
//! - [`AuthScopes`]: the set of OAuth scopes requested and granted
//! - [`oauth`]: the authorization code install flow

pub mod oauth;
mod scopes;

pub use scopes::AuthScopes;
