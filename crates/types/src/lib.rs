//! Shared data model for FileGuard.
//!
//! Identities are attributed by the ledger, fingerprints come from the
//! content store, and receipts/events describe the outcome of writes against
//! the access-control contract.

pub mod artifact;
pub mod event;
pub mod fingerprint;
pub mod identity;
pub mod receipt;

pub use artifact::*;
pub use event::*;
pub use fingerprint::*;
pub use identity::*;
pub use receipt::*;
