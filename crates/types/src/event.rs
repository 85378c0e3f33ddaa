use crate::{Fingerprint, Identity};
use serde::{Deserialize, Serialize};

/// Event emitted by every successful write to the access-control contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContractEvent {
    ContentRegistered {
        fingerprint: Fingerprint,
        by: Identity,
    },
    AccessGranted {
        subject: Identity,
    },
    AccessRevoked {
        subject: Identity,
    },
}

impl ContractEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ContractEvent::ContentRegistered { .. } => "content_registered",
            ContractEvent::AccessGranted { .. } => "access_granted",
            ContractEvent::AccessRevoked { .. } => "access_revoked",
        }
    }
}

/// Entry of the append-only event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Gap-free, starting at 1.
    pub sequence: u64,
    pub event: ContractEvent,
}
