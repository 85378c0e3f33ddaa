//! Collaborator handles shared by every phase of a run.

use crate::config::{ContentBackend, LedgerBackend, SimulationConfig};
use crate::errors::{Result, SimulationError};
use fileguard_access::{AccessControl, MemoryAccessControl};
use fileguard_content::{ContentStore, IpfsContentStore, MemoryContentStore};
use fileguard_ledger::RpcAccessControl;
use fileguard_types::{ContractArtifact, Identity};
use std::sync::Arc;
use tracing::info;

/// The three roles a simulation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participants {
    pub owner: Identity,
    pub authorized: Identity,
    pub unauthorized: Identity,
}

impl Participants {
    pub fn from_accounts(owner: u32, authorized: u32, unauthorized: u32) -> Self {
        Self {
            owner: Identity::account(owner),
            authorized: Identity::account(authorized),
            unauthorized: Identity::account(unauthorized),
        }
    }
}

impl Default for Participants {
    fn default() -> Self {
        Self::from_accounts(0, 1, 2)
    }
}

#[derive(Clone)]
pub struct SimulationContext {
    pub contract: Arc<dyn AccessControl>,
    pub store: Arc<dyn ContentStore>,
    pub participants: Participants,
}

impl SimulationContext {
    pub fn new(
        contract: Arc<dyn AccessControl>,
        store: Arc<dyn ContentStore>,
        participants: Participants,
    ) -> Self {
        Self {
            contract,
            store,
            participants,
        }
    }

    /// Fully in-process context: fresh contract owned by `participants.owner`.
    pub fn in_memory(participants: Participants) -> Self {
        Self::new(
            Arc::new(MemoryAccessControl::new(participants.owner)),
            Arc::new(MemoryContentStore::new()),
            participants,
        )
    }

    /// Build the backends selected by `config`.
    ///
    /// The rpc backend binds to the contract named in the artifact file; a
    /// missing or malformed artifact aborts.
    pub fn from_config(config: &SimulationConfig) -> Result<Self> {
        let participants = Participants::from_accounts(
            config.owner_account,
            config.authorized_account,
            config.unauthorized_account,
        );

        let contract: Arc<dyn AccessControl> = match config.ledger_backend {
            LedgerBackend::Memory => Arc::new(MemoryAccessControl::new(participants.owner)),
            LedgerBackend::Rpc => {
                let artifact = ContractArtifact::load(&config.artifact_path)
                    .map_err(|err| SimulationError::setup("loading contract artifact", err))?;
                info!(
                    address = %artifact.address,
                    ledger = %config.ledger_url,
                    "contract loaded"
                );
                Arc::new(
                    RpcAccessControl::from_artifact(
                        config.ledger_url.clone(),
                        &artifact,
                        config.rpc_options(),
                    )
                    .map_err(|err| SimulationError::setup("connecting to ledger", err))?,
                )
            }
        };

        let store: Arc<dyn ContentStore> = match config.content_backend {
            ContentBackend::Memory => Arc::new(MemoryContentStore::new()),
            ContentBackend::Ipfs => Arc::new(
                IpfsContentStore::new(config.ipfs_api.clone(), config.request_timeout())
                    .map_err(|err| SimulationError::setup("connecting to content store", err))?,
            ),
        };

        Ok(Self::new(contract, store, participants))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_participants_are_distinct() {
        let p = Participants::default();
        assert_ne!(p.owner, p.authorized);
        assert_ne!(p.owner, p.unauthorized);
        assert_ne!(p.authorized, p.unauthorized);
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let config = SimulationConfig {
            artifact_path: PathBuf::from("/nonexistent/AccessControl.json"),
            ..SimulationConfig::default()
        };
        let err = SimulationContext::from_config(&config).err().unwrap();
        assert!(matches!(
            err,
            SimulationError::Setup {
                step: "loading contract artifact",
                ..
            }
        ));
    }
}
