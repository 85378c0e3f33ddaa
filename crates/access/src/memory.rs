//! In-memory access-control contract
//!
//! Deterministic stand-in for the ledger: writes are applied atomically in
//! submission order under a single lock and finalize immediately.

use crate::call::ContractCall;
use crate::contract::AccessControl;
use crate::errors::*;
use crate::state::AccessState;
use async_trait::async_trait;
use fileguard_types::{EventRecord, Fingerprint, Identity, Registration, TxHash, TxReceipt};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
struct Inner {
    state: AccessState,
    events: Vec<EventRecord>,
    /// Number of submitted writes, including rejected ones.
    nonce: u64,
}

/// In-memory contract instance. Clones share the same state.
#[derive(Debug, Clone)]
pub struct MemoryAccessControl {
    label: Arc<str>,
    inner: Arc<RwLock<Inner>>,
}

impl MemoryAccessControl {
    /// Deploy a fresh contract owned by `owner`.
    pub fn new(owner: Identity) -> Self {
        Self::with_label(owner, "memory")
    }

    /// `label` namespaces transaction hashes (e.g. the contract address).
    pub fn with_label(owner: Identity, label: impl Into<String>) -> Self {
        Self {
            label: Arc::from(label.into()),
            inner: Arc::new(RwLock::new(Inner {
                state: AccessState::new(owner),
                events: Vec::new(),
                nonce: 0,
            })),
        }
    }

    /// Apply `call` as one totally-ordered write and return its receipt.
    ///
    /// Successful writes append their event to the log and come back
    /// finalized. Rejected writes still consume a nonce and come back
    /// reverted, leaving state and log untouched.
    pub fn execute(&self, caller: &Identity, call: &ContractCall) -> TxReceipt {
        let mut inner = self.inner.write();
        inner.nonce += 1;
        let tx_hash = TxHash::derive(&self.label, inner.nonce, caller, &call.encode());

        let event = match inner.state.apply(caller, call) {
            Ok(event) => event,
            Err(err) => {
                debug!(method = call.method(), caller = %caller, "write rejected: {}", err);
                let reason = err.revert_reason();
                return TxReceipt::reverted(tx_hash, reason.code, reason.message);
            }
        };

        let sequence = inner.events.len() as u64 + 1;
        inner.events.push(EventRecord {
            sequence,
            event: event.clone(),
        });
        info!(
            method = call.method(),
            sequence,
            tx = %tx_hash,
            "write finalized"
        );

        TxReceipt::finalized(tx_hash, sequence, event)
    }

    /// [`MemoryAccessControl::execute`], with reverts surfaced as errors.
    pub fn submit(&self, caller: &Identity, call: &ContractCall) -> Result<TxReceipt> {
        settle_receipt(caller, self.execute(caller, call))
    }

    pub fn snapshot(&self) -> AccessState {
        self.inner.read().state.clone()
    }
}

#[async_trait]
impl AccessControl for MemoryAccessControl {
    async fn register_content(&self, caller: &Identity, fingerprint: &str) -> Result<TxReceipt> {
        self.submit(
            caller,
            &ContractCall::RegisterContent {
                fingerprint: fingerprint.to_string(),
            },
        )
    }

    async fn grant_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt> {
        self.submit(caller, &ContractCall::GrantAccess { subject: *subject })
    }

    async fn revoke_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt> {
        self.submit(caller, &ContractCall::RevokeAccess { subject: *subject })
    }

    async fn access_file(&self, caller: &Identity) -> Result<Fingerprint> {
        self.inner.read().state.access_file(caller)
    }

    async fn is_authorized(&self, identity: &Identity) -> Result<bool> {
        Ok(self.inner.read().state.is_authorized(identity))
    }

    async fn owner(&self) -> Result<Identity> {
        Ok(*self.inner.read().state.owner())
    }

    async fn registration(&self) -> Result<Option<Registration>> {
        Ok(self.inner.read().state.registration().cloned())
    }

    async fn events(&self) -> Result<Vec<EventRecord>> {
        Ok(self.inner.read().events.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileguard_types::{ContractEvent, RevertCode, TxStatus};

    #[tokio::test]
    async fn test_every_write_is_a_distinct_event() {
        let owner = Identity::account(0);
        let contract = MemoryAccessControl::new(owner);

        let r1 = contract.register_content(&owner, "Qm123").await.unwrap();
        let r2 = contract.register_content(&owner, "Qm123").await.unwrap();

        assert_eq!(r1.status, TxStatus::Finalized);
        assert_eq!(r1.sequence, Some(1));
        assert_eq!(r2.sequence, Some(2));
        assert_ne!(r1.tx_hash, r2.tx_hash);

        let events = contract.events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event, events[1].event);
    }

    #[tokio::test]
    async fn test_rejected_write_leaves_log_untouched() {
        let owner = Identity::account(0);
        let attacker = Identity::account(2);
        let contract = MemoryAccessControl::new(owner);

        let err = contract.grant_access(&attacker, &attacker).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(contract.events().await.unwrap().is_empty());
        assert!(!contract.is_authorized(&attacker).await.unwrap());
    }

    #[tokio::test]
    async fn test_rejected_write_yields_reverted_receipt() {
        let owner = Identity::account(0);
        let attacker = Identity::account(2);
        let contract = MemoryAccessControl::with_label(owner, "0xabc");
        let call = ContractCall::GrantAccess { subject: attacker };

        let reverted = contract.execute(&attacker, &call);
        assert_eq!(reverted.status, TxStatus::Reverted);
        assert_eq!(reverted.revert.unwrap().code, RevertCode::Unauthorized);

        let accepted = contract.execute(&owner, &call);
        assert_ne!(accepted.tx_hash, reverted.tx_hash);
        assert_eq!(accepted.sequence, Some(1));
        assert_eq!(
            accepted.event,
            Some(ContractEvent::AccessGranted { subject: attacker })
        );
    }

    #[tokio::test]
    async fn test_invalid_fingerprint_reverts_as_invalid_argument() {
        let owner = Identity::account(0);
        let contract = MemoryAccessControl::new(owner);
        let err = contract.register_content(&owner, "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(contract.registration().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let owner = Identity::account(0);
        let contract = MemoryAccessControl::new(owner);
        let other = contract.clone();

        contract.register_content(&owner, "Qm123").await.unwrap();
        assert_eq!(
            other.registration().await.unwrap().unwrap().fingerprint.as_str(),
            "Qm123"
        );
        assert_eq!(other.owner().await.unwrap(), owner);
    }
}
