//! OAuth callback validation and code exchange.
//!
//! After the merchant approves the install, Shopify redirects to the
//! configured redirect path with `code`, `shop`, `state`, `timestamp` and
//! `hmac`. [`validate_auth_callback`] turns that query into a stored
//! [`StoreConnection`]:
//!
//! 1. Validate the shop domain
//! 2. Verify the query HMAC (primary secret, then the rotated one)
//! 3. Consume the single-use state for the shop
//! 4. Exchange the code for an offline access token
//! 5. Fetch shop metadata with the new token
//! 6. Upsert the connection into the registry
//!
//! A failure at any step leaves the registry untouched. An HMAC failure also
//! leaves the stored state in place, so a forged callback cannot burn the
//! merchant's pending install.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::hmac::validate_hmac;
use crate::auth::oauth::state_store::{consume_state, StateStore};
use crate::auth::oauth::AuthQuery;
use crate::clients::ProviderClient;
use crate::config::ShopDomain;
use crate::store::{ReconnectPolicy, StoreConnection, StoreRegistry};

/// Validates an OAuth callback and records the resulting connection.
///
/// Re-installing an already connected shop replaces its token, scopes and
/// metadata; `policy` decides whether the original `connected_at` survives.
///
/// # Errors
///
/// - [`OAuthError::InvalidShopDomain`] if `query.shop` is malformed
/// - [`OAuthError::InvalidHmac`] if the signature is absent or wrong
/// - [`OAuthError::CsrfStateMismatch`] if no unexpired state matches
/// - [`OAuthError::AuthCodeExchangeFailed`] if the token request fails
/// - [`OAuthError::MetadataFetchFailed`] if the metadata request fails
/// - [`OAuthError::Store`] if a store rejects the read or write
pub async fn validate_auth_callback(
    provider: &ProviderClient,
    state_store: &dyn StateStore,
    registry: &dyn StoreRegistry,
    query: &AuthQuery,
    policy: ReconnectPolicy,
) -> Result<StoreConnection, OAuthError> {
    let config = provider.config();
    let shop = ShopDomain::new(&query.shop).map_err(OAuthError::InvalidShopDomain)?;

    if !validate_hmac(query, config) {
        tracing::warn!(shop = %shop, "OAuth callback HMAC validation failed");
        return Err(OAuthError::InvalidHmac);
    }

    consume_state(state_store, &shop, &query.state).await?;

    let grant = provider
        .exchange_code(&shop, &query.code)
        .await
        .map_err(|error| {
            tracing::warn!(shop = %shop, error = %error, "authorization code exchange failed");
            OAuthError::AuthCodeExchangeFailed {
                status: error.status(),
            }
        })?;

    let metadata = provider
        .fetch_shop(&shop, &grant.access_token)
        .await
        .map_err(|error| {
            tracing::warn!(shop = %shop, error = %error, "shop metadata fetch failed");
            OAuthError::MetadataFetchFailed {
                status: error.status(),
            }
        })?;

    let connection = StoreConnection::new(shop, grant.access_token, grant.scope, metadata);
    let stored = registry.upsert(connection, policy).await?;

    tracing::info!(
        shop = %stored.shop,
        scopes = %stored.granted_scopes,
        "store connected"
    );
    Ok(stored)
}
