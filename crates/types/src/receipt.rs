use crate::{ContractEvent, Identity};
use serde::{Deserialize, Serialize};
use std::fmt;

const TX_HASH_CONTEXT: &str = "fileguard-tx";

/// Hash identifying a submitted transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    /// Derive the hash of the `sequence`-th write issued by `from`.
    pub fn derive(contract: &str, sequence: u64, from: &Identity, call: &[u8]) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(TX_HASH_CONTEXT.as_bytes());
        hasher.update(contract.as_bytes());
        hasher.update(&sequence.to_le_bytes());
        hasher.update(from.as_bytes());
        hasher.update(call);
        Self(*hasher.finalize().as_bytes())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(value: &str) -> Result<Self, String> {
        let raw = value.trim_start_matches("0x");
        if raw.len() != 64 {
            return Err(format!("tx hash must be 64 hex characters, got {}", raw.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(raw, &mut bytes).map_err(|e| format!("invalid hex: {e}"))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl From<TxHash> for String {
    fn from(value: TxHash) -> Self {
        value.to_hex()
    }
}

impl TryFrom<String> for TxHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TxHash::from_hex(&value)
    }
}

/// Lifecycle of a submitted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Pending,
    Finalized,
    Reverted,
}

/// Machine-readable reason attached to a reverted write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertCode {
    Unauthorized,
    InvalidArgument,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevertReason {
    pub code: RevertCode,
    pub message: String,
}

/// Receipt for a state-changing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub status: TxStatus,
    /// Position of the emitted event in the contract's event log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<ContractEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert: Option<RevertReason>,
}

impl TxReceipt {
    pub fn finalized(tx_hash: TxHash, sequence: u64, event: ContractEvent) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Finalized,
            sequence: Some(sequence),
            event: Some(event),
            revert: None,
        }
    }

    pub fn reverted(tx_hash: TxHash, code: RevertCode, message: impl Into<String>) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Reverted,
            sequence: None,
            event: None,
            revert: Some(RevertReason {
                code,
                message: message.into(),
            }),
        }
    }

    /// Placeholder reported while a write awaits finality.
    pub fn pending(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            status: TxStatus::Pending,
            sequence: None,
            event: None,
            revert: None,
        }
    }

    pub fn is_final(&self) -> bool {
        self.status != TxStatus::Pending
    }
}
