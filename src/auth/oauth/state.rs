//! OAuth state parameter for CSRF protection.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::fmt;

/// The `state` nonce binding an authorize redirect to its callback.
///
/// Generated from the thread-local CSPRNG: 32 alphanumeric characters, about
/// 190 bits of entropy.
///
/// # Example
///
/// ```rust
/// use shop_connect::auth::oauth::StateParam;
///
/// let state = StateParam::new();
/// assert_eq!(state.nonce().len(), 32);
/// assert!(state.nonce().chars().all(|c| c.is_ascii_alphanumeric()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateParam {
    value: String,
}

// Verify StateParam is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StateParam>();
};

impl StateParam {
    const NONCE_LENGTH: usize = 32;

    /// Generates a fresh random nonce.
    #[must_use]
    pub fn new() -> Self {
        let value: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(Self::NONCE_LENGTH)
            .map(char::from)
            .collect();

        Self { value }
    }

    /// Wraps a nonce presented by a callback.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self { value: raw.into() }
    }

    /// Returns the nonce string.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.value
    }
}

impl Default for StateParam {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for StateParam {
    fn as_ref(&self) -> &str {
        &self.value
    }
}
