//! Content fingerprints and the single-slot registration record.

use crate::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Errors emitted when constructing a fingerprint.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint must not be empty")]
    Empty,
}

/// Opaque content identifier returned by the content store.
///
/// The value is never interpreted beyond equality; an IPFS CID and a base58
/// BLAKE3 digest are both valid fingerprints. Only the empty string is
/// rejected.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Result<Self, FingerprintError> {
        let value = value.into();
        if value.is_empty() {
            return Err(FingerprintError::Empty);
        }
        Ok(Self(value))
    }

    /// Fingerprint of a 32-byte digest, encoded as base58.
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(bs58::encode(digest).into_string())
    }

    /// Decode a fingerprint produced by [`Fingerprint::from_digest`].
    pub fn to_digest(&self) -> Option<[u8; 32]> {
        let bytes = bs58::decode(&self.0).into_vec().ok()?;
        bytes.try_into().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

impl From<Fingerprint> for String {
    fn from(value: Fingerprint) -> Self {
        value.0
    }
}

impl TryFrom<String> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Fingerprint::new(value)
    }
}

impl TryFrom<&str> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Fingerprint::new(value)
    }
}

/// The one registered piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub fingerprint: Fingerprint,
    pub registered_by: Identity,
}
