use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors that can occur when parsing an identity string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("identity must start with 'i'")]
    InvalidPrefix,
    #[error("identity must be {expected} characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("identity payload is not valid hexadecimal: {0}")]
    InvalidHex(String),
}

/// Number of raw bytes contained in an identity.
pub const IDENTITY_BYTES: usize = 32;
/// Expected string length of an encoded identity (prefix + 64 hex chars).
pub const IDENTITY_STRING_LENGTH: usize = 1 + IDENTITY_BYTES * 2;

const ACCOUNT_CONTEXT: &str = "fileguard-account";

/// Encode a 32-byte account identifier into the human readable form.
///
/// The encoded identity always begins with the character `i` followed by the
/// hexadecimal representation of the raw bytes.
pub fn encode_identity(bytes: &[u8; IDENTITY_BYTES]) -> String {
    let mut encoded = String::with_capacity(IDENTITY_STRING_LENGTH);
    encoded.push('i');
    encoded.push_str(&hex::encode(bytes));
    encoded
}

/// Decode a human readable identity string into the raw bytes.
pub fn decode_identity(value: &str) -> Result<[u8; IDENTITY_BYTES], IdentityError> {
    if !value.starts_with('i') {
        return Err(IdentityError::InvalidPrefix);
    }

    if value.len() != IDENTITY_STRING_LENGTH {
        return Err(IdentityError::InvalidLength {
            expected: IDENTITY_STRING_LENGTH,
            actual: value.len(),
        });
    }

    let mut bytes = [0u8; IDENTITY_BYTES];
    hex::decode_to_slice(&value[1..], &mut bytes)
        .map_err(|err| IdentityError::InvalidHex(err.to_string()))?;
    Ok(bytes)
}

/// Caller identity as attributed by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(pub [u8; IDENTITY_BYTES]);

impl Identity {
    pub fn from_bytes(bytes: [u8; IDENTITY_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_BYTES] {
        &self.0
    }

    /// Deterministic identity derived from a label.
    pub fn derive(label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ACCOUNT_CONTEXT.as_bytes());
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// The `index`-th well-known devnet account.
    ///
    /// Account 0 deploys and owns the contract, account 1 is the authorized
    /// user and account 2 plays the attacker in simulations.
    pub fn account(index: u32) -> Self {
        Self::derive(&format!("account-{index}"))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_identity(&self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", encode_identity(&self.0))
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_identity(s.trim()).map(Identity)
    }
}

impl From<[u8; IDENTITY_BYTES]> for Identity {
    fn from(value: [u8; IDENTITY_BYTES]) -> Self {
        Identity(value)
    }
}

impl From<Identity> for String {
    fn from(value: Identity) -> Self {
        encode_identity(&value.0)
    }
}

impl TryFrom<String> for Identity {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
