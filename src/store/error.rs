//! Store repository errors.

use thiserror::Error;

/// Errors raised by a [`StoreRegistry`](super::StoreRegistry) backend.
///
/// The in-memory registry never fails; persistent backends map their driver
/// errors into [`StoreError::Backend`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The storage backend failed to complete the operation.
    #[error("Store backend error: {message}")]
    Backend {
        /// Backend-specific description. Must not contain access tokens.
        message: String,
    },
}

impl StoreError {
    /// Creates a backend error from any displayable cause.
    pub fn backend(cause: impl std::fmt::Display) -> Self {
        Self::Backend {
            message: cause.to_string(),
        }
    }
}
