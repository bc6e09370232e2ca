//! Store lifecycle operations over the registry: disconnect and listing.

mod manager;
mod revocation;

pub use manager::StoreManager;
pub use revocation::{DisconnectOutcome, RevocationError, RevocationService};
