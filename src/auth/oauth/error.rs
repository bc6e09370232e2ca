//! OAuth-specific error types.
//!
//! # Error Types
//!
//! - [`OAuthError::InvalidShopDomain`]: the shop parameter failed validation
//! - [`OAuthError::CsrfStateMismatch`]: no matching, unexpired state for the shop
//! - [`OAuthError::InvalidHmac`]: the callback query signature is wrong
//! - [`OAuthError::AuthCodeExchangeFailed`]: the code-for-token POST failed
//! - [`OAuthError::MetadataFetchFailed`]: the shop metadata GET failed
//! - [`OAuthError::MissingHostConfig`]: no host URL to build `redirect_uri`
//! - [`OAuthError::InvalidScopes`]: a scope override requests write access
//! - [`OAuthError::Store`]: the store registry rejected the write
//!
//! # Example
//!
//! ```rust
//! use shop_connect::auth::oauth::OAuthError;
//!
//! let error = OAuthError::AuthCodeExchangeFailed { status: Some(400) };
//! assert_eq!(error.to_string(), "Authorization code exchange failed (status 400)");
//! ```

use thiserror::Error;

use crate::error::{status_suffix, ConfigError};
use crate::store::StoreError;

/// Errors that can occur during the install flow.
///
/// Display strings carry at most an HTTP status. Provider response bodies,
/// the client secret and access tokens never appear in them.
#[derive(Debug, Error)]
pub enum OAuthError {
    /// The shop domain failed format validation.
    ///
    /// Raised before any state is stored or any URL is built.
    #[error(transparent)]
    InvalidShopDomain(ConfigError),

    /// No stored state matched the presented nonce.
    ///
    /// Covers an absent entry, an expired entry, a nonce for another shop and a
    /// replayed nonce. The flow stops before any token exchange is attempted.
    #[error("OAuth state is missing, expired or does not match")]
    CsrfStateMismatch,

    /// HMAC signature of the callback query did not verify.
    #[error("HMAC signature validation failed")]
    InvalidHmac,

    /// The authorization code could not be exchanged for an access token.
    ///
    /// `status` is `None` when the request never produced a response
    /// (connect failure, timeout, malformed body).
    #[error("Authorization code exchange failed{}", status_suffix(.status))]
    AuthCodeExchangeFailed {
        /// HTTP status returned by the provider, if any.
        status: Option<u16>,
    },

    /// Shop metadata could not be fetched with the new access token.
    #[error("Shop metadata fetch failed{}", status_suffix(.status))]
    MetadataFetchFailed {
        /// HTTP status returned by the provider, if any.
        status: Option<u16>,
    },

    /// Host URL is not configured.
    ///
    /// [`begin_auth`](super::begin_auth) needs it to build the redirect URI.
    /// Configure it via `ConnectConfigBuilder::host()`.
    #[error("Host URL must be configured in ConnectConfig for OAuth")]
    MissingHostConfig,

    /// A per-call scope override requested a non read-only scope.
    #[error("Scope '{scope}' is not read-only")]
    InvalidScopes {
        /// The offending scope.
        scope: String,
    },

    /// The state store or store registry failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Verify OAuthError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OAuthError>();
};
