//! Error types for the access-control contract

use fileguard_types::{FingerprintError, Identity, RevertCode, RevertReason, TxReceipt, TxStatus};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// A write was attempted by someone other than the owner.
    #[error("Unauthorized: {caller} is not the contract owner")]
    Unauthorized { caller: Identity },

    /// Read refused. Deliberately carries no cause.
    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The ledger round-trip failed before an authorization decision was made.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Coarse classification used by callers that branch on the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthorized,
    AccessDenied,
    InvalidArgument,
    Transport,
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::Unauthorized { .. } => ErrorKind::Unauthorized,
            AccessError::AccessDenied => ErrorKind::AccessDenied,
            AccessError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AccessError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// True when the contract itself refused the request.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unauthorized | ErrorKind::AccessDenied
        )
    }
}

impl AccessError {
    /// Reason recorded on the receipt of a write rejected with this error.
    pub fn revert_reason(&self) -> RevertReason {
        match self {
            AccessError::Unauthorized { caller } => RevertReason {
                code: RevertCode::Unauthorized,
                message: format!("{caller} is not the contract owner"),
            },
            AccessError::InvalidArgument(message) => RevertReason {
                code: RevertCode::InvalidArgument,
                message: message.clone(),
            },
            other => RevertReason {
                code: RevertCode::InvalidArgument,
                message: other.to_string(),
            },
        }
    }

    /// Rebuild the error a reverted write of `caller` corresponds to.
    pub fn from_revert(caller: &Identity, reason: &RevertReason) -> Self {
        match reason.code {
            RevertCode::Unauthorized => AccessError::Unauthorized { caller: *caller },
            RevertCode::InvalidArgument => AccessError::InvalidArgument(reason.message.clone()),
        }
    }
}

/// Turn a final receipt into the caller-facing result.
pub fn settle_receipt(caller: &Identity, receipt: TxReceipt) -> Result<TxReceipt> {
    match receipt.status {
        TxStatus::Finalized => Ok(receipt),
        TxStatus::Reverted => {
            let reason = receipt.revert.unwrap_or(RevertReason {
                code: RevertCode::InvalidArgument,
                message: "reverted without reason".to_string(),
            });
            Err(AccessError::from_revert(caller, &reason))
        }
        TxStatus::Pending => Err(AccessError::Transport(format!(
            "transaction {} is not final",
            receipt.tx_hash
        ))),
    }
}

impl From<FingerprintError> for AccessError {
    fn from(err: FingerprintError) -> Self {
        AccessError::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
