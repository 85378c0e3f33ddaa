//! FileGuard content layer
//!
//! Content-addressed store clients (in-memory BLAKE3 and IPFS HTTP) and the
//! integrity verifier that detects tampering by comparing fingerprints.

pub mod errors;
pub mod integrity;
pub mod ipfs;
pub mod store;

pub use errors::{ContentError, IntegrityError, Result};
pub use integrity::IntegrityVerifier;
pub use ipfs::{IpfsContentStore, DEFAULT_IPFS_API};
pub use store::{ContentStore, MemoryContentStore};
