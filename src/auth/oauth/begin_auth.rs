//! Authorize redirect construction.

use crate::auth::oauth::error::OAuthError;
use crate::auth::oauth::state::StateParam;
use crate::auth::oauth::state_store::{OAuthState, StateStore};
use crate::auth::AuthScopes;
use crate::config::{ConnectConfig, ShopDomain};

/// Result of [`begin_auth`]: where to send the merchant, and the nonce that
/// was stored for the callback.
#[derive(Clone, Debug)]
pub struct BeginAuthResult {
    /// The shop the redirect targets, in canonical form.
    pub shop: ShopDomain,

    /// Full authorize URL to redirect the merchant's browser to.
    pub auth_url: String,

    /// The nonce sent as `state`.
    pub state: StateParam,
}

/// Starts an install: validates the shop, stores a fresh state nonce and
/// builds the authorize URL.
///
/// The URL has the form
/// `{provider}/admin/oauth/authorize?client_id=..&scope=..&redirect_uri=..&state=..`
/// where `scope` is the comma-joined read-only scope list and `redirect_uri`
/// is the configured host followed by the redirect path.
///
/// `scope_override` replaces the configured scopes for this redirect; it is
/// held to the same read-only rule.
///
/// # Errors
///
/// - [`OAuthError::InvalidShopDomain`] if `shop` is malformed; nothing is stored
/// - [`OAuthError::MissingHostConfig`] if no host URL is configured
/// - [`OAuthError::InvalidScopes`] if the override requests write access
/// - [`OAuthError::Store`] if the state store fails
///
/// # Example
///
/// ```rust
/// # async fn run() -> Result<(), shop_connect::auth::oauth::OAuthError> {
/// use shop_connect::{ApiKey, ApiSecretKey, ConnectConfig, HostUrl};
/// use shop_connect::auth::oauth::{begin_auth, InMemoryStateStore};
///
/// let config = ConnectConfig::builder()
///     .api_key(ApiKey::new("client-id").unwrap())
///     .api_secret_key(ApiSecretKey::new("secret").unwrap())
///     .host(HostUrl::new("https://myapp.example.com").unwrap())
///     .build()
///     .unwrap();
/// let states = InMemoryStateStore::new();
///
/// let result = begin_auth(&config, &states, "demo-store", None).await?;
/// assert!(result
///     .auth_url
///     .starts_with("https://demo-store.myshopify.com/admin/oauth/authorize?client_id=client-id"));
/// # Ok(())
/// # }
/// ```
pub async fn begin_auth(
    config: &ConnectConfig,
    state_store: &dyn StateStore,
    shop: &str,
    scope_override: Option<&AuthScopes>,
) -> Result<BeginAuthResult, OAuthError> {
    let shop = ShopDomain::new(shop).map_err(OAuthError::InvalidShopDomain)?;
    let host = config.host().ok_or(OAuthError::MissingHostConfig)?;

    let scopes = scope_override.unwrap_or_else(|| config.scopes());
    if let Some(scope) = scopes.iter().find(|s| !AuthScopes::is_read_only(s)) {
        return Err(OAuthError::InvalidScopes {
            scope: scope.to_string(),
        });
    }

    let issued = OAuthState::issue(shop.clone(), config.state_ttl());
    let state = issued.nonce.clone();
    state_store.put(issued).await?;

    let redirect_uri = format!("{}{}", host.as_ref(), config.redirect_path());
    let params = [
        ("client_id", config.api_key().as_ref().to_string()),
        ("scope", scopes.to_string()),
        ("redirect_uri", redirect_uri),
        ("state", state.to_string()),
    ];

    let query_string = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let auth_url = format!(
        "{}?{}",
        config.provider_url(&shop, "/admin/oauth/authorize"),
        query_string
    );

    tracing::debug!(shop = %shop, "issued OAuth state and authorize URL");

    Ok(BeginAuthResult {
        shop,
        auth_url,
        state,
    })
}

// Verify BeginAuthResult is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<BeginAuthResult>();
};
