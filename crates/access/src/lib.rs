//! Access control for a single registered file
//!
//! The contract has one owner, a set of explicitly authorized identities and
//! one registration slot holding the content fingerprint. Only the owner may
//! register content or change the authorized set; any authorized identity may
//! read the fingerprint.

pub mod call;
pub mod contract;
pub mod errors;
pub mod memory;
pub mod state;

pub use call::ContractCall;
pub use contract::AccessControl;
pub use errors::*;
pub use memory::MemoryAccessControl;
pub use state::{AccessState, DenialCause};
