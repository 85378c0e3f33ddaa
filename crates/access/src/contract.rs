//! Operation contract shared by every access-control backend.

use crate::errors::Result;
use async_trait::async_trait;
use fileguard_types::{EventRecord, Fingerprint, Identity, Registration, TxReceipt};

/// Access-control contract as seen by a client.
///
/// Writes return only once the change is final. Reads never mutate state.
/// Implementations must give identical answers for identical histories.
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Register (or overwrite) the single content fingerprint. Owner only.
    async fn register_content(&self, caller: &Identity, fingerprint: &str) -> Result<TxReceipt>;

    /// Add `subject` to the authorized set. Owner only, idempotent.
    async fn grant_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt>;

    /// Remove `subject` from the authorized set. Owner only, idempotent.
    async fn revoke_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt>;

    /// Return the registered fingerprint if `caller` may read it.
    async fn access_file(&self, caller: &Identity) -> Result<Fingerprint>;

    async fn is_authorized(&self, identity: &Identity) -> Result<bool>;

    async fn owner(&self) -> Result<Identity>;

    async fn registration(&self) -> Result<Option<Registration>>;

    /// Ordered log of every successful write.
    async fn events(&self) -> Result<Vec<EventRecord>>;
}
