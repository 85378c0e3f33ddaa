//! RPC adapter for a contract deployed on the ledger.

use crate::api::*;
use async_trait::async_trait;
use fileguard_access::{settle_receipt, AccessControl, AccessError, ContractCall, Result};
use fileguard_types::{
    ContractAddress, ContractArtifact, EventRecord, Fingerprint, Identity, Registration, TxHash,
    TxReceipt,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Timeouts governing every round-trip to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcOptions {
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
    /// Upper bound on waiting for a submitted write to become final.
    pub finality_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for RpcOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            finality_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
        }
    }
}

fn transport(err: reqwest::Error) -> AccessError {
    AccessError::Transport(err.to_string())
}

fn http_client(options: &RpcOptions) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(options.request_timeout)
        .build()
        .map_err(|err| AccessError::Transport(format!("build http client: {err}")))
}

fn join(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map a non-2xx ledger response onto the contract's error kinds.
async fn error_from_response(response: reqwest::Response) -> AccessError {
    let status = response.status();
    let body = response.json::<ErrorResponse>().await.ok();
    match body {
        Some(err) if err.code == CODE_ACCESS_DENIED => AccessError::AccessDenied,
        Some(err) => AccessError::Transport(format!(
            "ledger returned {status} ({}): {}",
            err.code, err.error
        )),
        None => AccessError::Transport(format!("ledger returned {status}")),
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    response.json::<T>().await.map_err(transport)
}

/// [`AccessControl`] backed by a contract on the ledger HTTP surface.
///
/// Writes are submitted as transactions and only return once their receipt
/// is final. Reads are answered directly by the ledger.
#[derive(Clone, Debug)]
pub struct RpcAccessControl {
    client: reqwest::Client,
    base_url: String,
    address: ContractAddress,
    options: RpcOptions,
}

impl RpcAccessControl {
    pub fn new(
        base_url: impl Into<String>,
        address: ContractAddress,
        options: RpcOptions,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(&options)?,
            base_url: base_url.into(),
            address,
            options,
        })
    }

    pub fn from_artifact(
        base_url: impl Into<String>,
        artifact: &ContractArtifact,
        options: RpcOptions,
    ) -> Result<Self> {
        Self::new(base_url, artifact.address.clone(), options)
    }

    /// Create a new contract owned by `owner` and return its artifact.
    pub async fn deploy(
        base_url: &str,
        owner: &Identity,
        options: RpcOptions,
    ) -> Result<ContractArtifact> {
        let client = http_client(&options)?;
        let response = client
            .post(join(base_url, "contracts"))
            .json(&DeployRequest { owner: *owner })
            .send()
            .await
            .map_err(transport)?;
        let deployed: DeployResponse = decode(response).await?;
        debug!(address = %deployed.address, "contract deployed");
        Ok(ContractArtifact {
            descriptor: deployed.descriptor,
            address: deployed.address,
        })
    }

    pub fn address(&self) -> &ContractAddress {
        &self.address
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join(&self.base_url, path)
    }

    fn contract_endpoint(&self, path: &str) -> String {
        self.endpoint(&format!("contracts/{}/{}", self.address, path))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self.client.get(url).send().await.map_err(transport)?;
        decode(response).await
    }

    async fn submit(&self, from: &Identity, call: ContractCall) -> Result<TxReceipt> {
        let method = call.method();
        let response = self
            .client
            .post(self.contract_endpoint("tx"))
            .json(&SubmitTxRequest { from: *from, call })
            .send()
            .await
            .map_err(transport)?;
        let submitted: SubmitTxResponse = decode(response).await?;
        debug!(method, tx = %submitted.tx_hash, "transaction submitted");

        let receipt = self.wait_for_finality(&submitted.tx_hash).await?;
        settle_receipt(from, receipt)
    }

    /// Poll the receipt until it leaves `pending` or the finality timeout runs out.
    pub async fn wait_for_finality(&self, tx_hash: &TxHash) -> Result<TxReceipt> {
        let deadline = Instant::now() + self.options.finality_timeout;
        let url = self.endpoint(&format!("tx/{tx_hash}"));
        loop {
            let response = self.client.get(&url).send().await.map_err(transport)?;
            // A receipt may not be indexed yet right after submission.
            if response.status() != StatusCode::NOT_FOUND {
                let receipt: TxReceipt = decode(response).await?;
                if receipt.is_final() {
                    return Ok(receipt);
                }
            }
            if Instant::now() >= deadline {
                warn!(tx = %tx_hash, "transaction not final within {:?}", self.options.finality_timeout);
                return Err(AccessError::Transport(format!(
                    "transaction {tx_hash} not final within {:?}",
                    self.options.finality_timeout
                )));
            }
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }

    /// Ledger health probe.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json(self.endpoint("health")).await
    }

    pub async fn info(&self) -> Result<ContractInfoResponse> {
        self.get_json(self.endpoint(&format!("contracts/{}", self.address)))
            .await
    }
}

#[async_trait]
impl AccessControl for RpcAccessControl {
    async fn register_content(&self, caller: &Identity, fingerprint: &str) -> Result<TxReceipt> {
        self.submit(
            caller,
            ContractCall::RegisterContent {
                fingerprint: fingerprint.to_string(),
            },
        )
        .await
    }

    async fn grant_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt> {
        self.submit(caller, ContractCall::GrantAccess { subject: *subject })
            .await
    }

    async fn revoke_access(&self, caller: &Identity, subject: &Identity) -> Result<TxReceipt> {
        self.submit(caller, ContractCall::RevokeAccess { subject: *subject })
            .await
    }

    async fn access_file(&self, caller: &Identity) -> Result<Fingerprint> {
        let response = self
            .client
            .post(self.contract_endpoint("call/access_file"))
            .json(&CallRequest {
                from: caller.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        let body: AccessFileResponse = decode(response).await?;
        Ok(body.fingerprint)
    }

    async fn is_authorized(&self, identity: &Identity) -> Result<bool> {
        let body: AuthorizedResponse = self
            .get_json(self.contract_endpoint(&format!("authorized/{identity}")))
            .await?;
        Ok(body.authorized)
    }

    async fn owner(&self) -> Result<Identity> {
        Ok(self.info().await?.owner)
    }

    async fn registration(&self) -> Result<Option<Registration>> {
        let body: RegistrationResponse =
            self.get_json(self.contract_endpoint("registration")).await?;
        Ok(body.registration)
    }

    async fn events(&self) -> Result<Vec<EventRecord>> {
        let body: EventsResponse = self.get_json(self.contract_endpoint("events")).await?;
        Ok(body.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_trims_slashes() {
        assert_eq!(
            join("http://127.0.0.1:8545/", "/contracts"),
            "http://127.0.0.1:8545/contracts"
        );
        assert_eq!(join("http://host", "tx/0x01"), "http://host/tx/0x01");
    }

    #[test]
    fn test_default_options() {
        let options = RpcOptions::default();
        assert_eq!(options.request_timeout, Duration::from_secs(10));
        assert_eq!(options.finality_timeout, Duration::from_secs(30));
        assert_eq!(options.poll_interval, Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_unreachable_ledger_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let owner = Identity::account(0);
        let contract = RpcAccessControl::new(
            format!("http://{addr}"),
            ContractAddress::derive(&owner, 0),
            RpcOptions::default(),
        )
        .unwrap();
        let err = contract.access_file(&owner).await.unwrap_err();
        assert!(matches!(err, AccessError::Transport(_)));
    }
}
