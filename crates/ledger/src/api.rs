//! Wire types shared by the devnet server and the RPC client.

use fileguard_access::ContractCall;
use fileguard_types::{
    ContractAddress, ContractDescriptor, EventRecord, Fingerprint, Identity, Registration, TxHash,
};
use serde::{Deserialize, Serialize};

/// Error codes carried in the body of non-2xx responses.
pub const CODE_ACCESS_DENIED: &str = "access_denied";
pub const CODE_NOT_FOUND: &str = "not_found";
pub const CODE_BAD_REQUEST: &str = "bad_request";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployRequest {
    pub owner: Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployResponse {
    pub address: ContractAddress,
    pub descriptor: ContractDescriptor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTxRequest {
    pub from: Identity,
    pub call: ContractCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTxResponse {
    pub tx_hash: TxHash,
}

/// Read call attributed to `from`.
///
/// Kept as a raw string so an unresolvable caller is refused by the contract
/// like any other unknown identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessFileResponse {
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedResponse {
    pub identity: Identity,
    pub authorized: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInfoResponse {
    pub address: ContractAddress,
    pub descriptor: ContractDescriptor,
    pub owner: Identity,
    pub event_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub registration: Option<Registration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub contracts: usize,
    pub transactions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}
