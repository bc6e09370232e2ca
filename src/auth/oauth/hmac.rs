//! HMAC-SHA256 signing shared by callback and webhook verification.
//!
//! OAuth callbacks are signed with a lowercase hex digest over the sorted query
//! string; webhook deliveries are signed with a base64 digest over the raw
//! body. Both comparisons run in constant time and fall back to the rotated
//! secret key when one is configured.
//!
//! # Example
//!
//! ```rust
//! use shop_connect::auth::oauth::hmac::{compute_signature, compute_signature_base64};
//!
//! let signature = compute_signature("code=abc123&shop=demo-store.myshopify.com", "secret");
//! assert_eq!(signature.len(), 64);
//!
//! let webhook_sig = compute_signature_base64(b"webhook payload", "secret");
//! assert_eq!(webhook_sig.len(), 44);
//! ```

use std::fmt::Write;

use base64::prelude::{Engine as _, BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::auth::oauth::AuthQuery;
use crate::config::ConnectConfig;

type HmacSha256 = Hmac<Sha256>;

fn digest(message: &[u8], secret: &str) -> [u8; 32] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// Computes a lowercase hex HMAC-SHA256 signature of `message`.
#[must_use]
pub fn compute_signature(message: &str, secret: &str) -> String {
    digest(message.as_bytes(), secret)
        .iter()
        .fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// Computes a base64 HMAC-SHA256 signature of raw `message` bytes.
#[must_use]
pub fn compute_signature_base64(message: &[u8], secret: &str) -> String {
    BASE64_STANDARD.encode(digest(message, secret))
}

/// Compares two strings without short-circuiting on the first difference.
#[must_use]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Checks `received` against `sign(secret)` for the primary secret, then for
/// the rotated secret if one is configured.
pub(crate) fn verify_with_rotation(
    config: &ConnectConfig,
    received: &str,
    sign: impl Fn(&str) -> String,
) -> bool {
    if constant_time_compare(&sign(config.api_secret_key().as_ref()), received) {
        return true;
    }

    config
        .old_api_secret_key()
        .is_some_and(|old| constant_time_compare(&sign(old.as_ref()), received))
}

/// Validates the `hmac` parameter of an OAuth callback query.
#[must_use]
pub fn validate_hmac(query: &AuthQuery, config: &ConnectConfig) -> bool {
    if query.hmac.is_empty() {
        return false;
    }
    let signable = query.to_signable_string();
    verify_with_rotation(config, &query.hmac, |secret| {
        compute_signature(&signable, secret)
    })
}
