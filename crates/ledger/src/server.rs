//! Devnet ledger HTTP server
//!
//! Hosts any number of access-control contracts, each backed by a
//! [`MemoryAccessControl`] that serializes its writes. Receipts stay
//! `pending` for the configured confirmation delay before turning final, so
//! clients have to wait for finality the same way they would on a real chain.

use crate::api::*;
use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use fileguard_access::{AccessControl, AccessError, ContractCall, MemoryAccessControl};
use fileguard_types::{ContractAddress, ContractDescriptor, Identity, TxHash, TxReceipt};
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub type SharedLedger = Arc<DevnetLedger>;

/// Receipts kept before the oldest are evicted.
pub const DEFAULT_RECEIPT_RETENTION: usize = 100_000;

#[derive(Debug)]
struct RecordedTx {
    receipt: TxReceipt,
    final_at: Instant,
}

/// Receipts in submission order, bounded by `capacity`.
#[derive(Debug, Default)]
struct ReceiptLog {
    by_hash: HashMap<TxHash, RecordedTx>,
    order: VecDeque<TxHash>,
}

impl ReceiptLog {
    fn insert(&mut self, tx_hash: TxHash, recorded: RecordedTx, capacity: usize) {
        if self.by_hash.insert(tx_hash, recorded).is_none() {
            self.order.push_back(tx_hash);
        }
        while self.order.len() > capacity {
            if let Some(evicted) = self.order.pop_front() {
                self.by_hash.remove(&evicted);
            }
        }
    }
}

/// In-process ledger substrate.
#[derive(Debug)]
pub struct DevnetLedger {
    contracts: RwLock<HashMap<ContractAddress, MemoryAccessControl>>,
    receipts: RwLock<ReceiptLog>,
    deploy_nonces: RwLock<HashMap<Identity, u64>>,
    confirmation_delay: Duration,
    receipt_retention: usize,
}

impl Default for DevnetLedger {
    fn default() -> Self {
        Self {
            contracts: RwLock::default(),
            receipts: RwLock::default(),
            deploy_nonces: RwLock::default(),
            confirmation_delay: Duration::ZERO,
            receipt_retention: DEFAULT_RECEIPT_RETENTION,
        }
    }
}

impl DevnetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receipts are reported as pending for `delay` after submission.
    pub fn with_confirmation_delay(delay: Duration) -> Self {
        Self {
            confirmation_delay: delay,
            ..Self::default()
        }
    }

    /// Keep at most `capacity` receipts (minimum one); older ones are
    /// evicted and look unknown to clients.
    pub fn with_receipt_retention(mut self, capacity: usize) -> Self {
        self.receipt_retention = capacity.max(1);
        self
    }

    pub fn confirmation_delay(&self) -> Duration {
        self.confirmation_delay
    }

    /// Create a fresh contract owned by `owner` and return its address.
    pub fn deploy(&self, owner: Identity) -> ContractAddress {
        let nonce = {
            let mut nonces = self.deploy_nonces.write();
            let slot = nonces.entry(owner).or_insert(0);
            let nonce = *slot;
            *slot += 1;
            nonce
        };
        let address = ContractAddress::derive(&owner, nonce);
        let contract = MemoryAccessControl::with_label(owner, address.as_str());
        self.contracts.write().insert(address.clone(), contract);
        info!(%address, %owner, "contract deployed");
        address
    }

    pub fn contract(&self, address: &ContractAddress) -> Option<MemoryAccessControl> {
        self.contracts.read().get(address).cloned()
    }

    /// Execute `call` against the contract at `address` and record its receipt.
    ///
    /// Returns `None` when no contract lives at `address`.
    pub fn submit(
        &self,
        address: &ContractAddress,
        from: &Identity,
        call: &ContractCall,
    ) -> Option<TxHash> {
        let contract = self.contract(address)?;
        let receipt = contract.execute(from, call);
        let tx_hash = receipt.tx_hash;
        debug!(%address, tx = %tx_hash, status = ?receipt.status, "transaction recorded");
        self.receipts.write().insert(
            tx_hash,
            RecordedTx {
                receipt,
                final_at: Instant::now() + self.confirmation_delay,
            },
            self.receipt_retention,
        );
        Some(tx_hash)
    }

    /// Receipt as currently observable: pending until the delay elapses.
    pub fn receipt(&self, tx_hash: &TxHash) -> Option<TxReceipt> {
        let receipts = self.receipts.read();
        let recorded = receipts.by_hash.get(tx_hash)?;
        if Instant::now() < recorded.final_at {
            Some(TxReceipt::pending(*tx_hash))
        } else {
            Some(recorded.receipt.clone())
        }
    }

    pub fn contract_count(&self) -> usize {
        self.contracts.read().len()
    }

    pub fn transaction_count(&self) -> usize {
        self.receipts.read().by_hash.len()
    }
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, code: &'static str, message: S) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn not_found<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::NOT_FOUND, CODE_NOT_FOUND, message)
    }

    fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::BAD_REQUEST, CODE_BAD_REQUEST, message)
    }

    fn access_denied() -> Self {
        Self::new(StatusCode::FORBIDDEN, CODE_ACCESS_DENIED, "access denied")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            code: self.code.to_string(),
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

pub async fn start_server(ledger: SharedLedger, addr: &str) -> Result<()> {
    let listener = bind_listener(addr).await?;
    let local = listener
        .local_addr()
        .context("failed to read ledger listener address")?;
    info!("devnet ledger listening on {}", local);
    serve(listener, ledger).await
}

/// Serve the ledger on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, ledger: SharedLedger) -> Result<()> {
    axum::serve(listener, build_router(ledger))
        .await
        .context("ledger server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind ledger listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind ledger listener on {addr}"))
    }
}

pub fn build_router(ledger: SharedLedger) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/contracts", post(handle_deploy))
        .route("/contracts/:address", get(handle_contract_info))
        .route("/contracts/:address/tx", post(handle_submit_tx))
        .route(
            "/contracts/:address/call/access_file",
            post(handle_access_file),
        )
        .route(
            "/contracts/:address/authorized/:identity",
            get(handle_is_authorized),
        )
        .route("/contracts/:address/registration", get(handle_registration))
        .route("/contracts/:address/events", get(handle_events))
        .route("/tx/:hash", get(handle_get_receipt))
        .layer(TraceLayer::new_for_http())
        .with_state(ledger)
}

fn parse_address(address: &str) -> Result<ContractAddress, ApiError> {
    ContractAddress::parse(address).map_err(|err| ApiError::bad_request(err.to_string()))
}

fn lookup(
    ledger: &DevnetLedger,
    address: &str,
) -> Result<(ContractAddress, MemoryAccessControl), ApiError> {
    let address = parse_address(address)?;
    let contract = ledger
        .contract(&address)
        .ok_or_else(|| ApiError::not_found(format!("no contract at {address}")))?;
    Ok((address, contract))
}

/// Reads on the in-memory contract only fail for reasons a client cannot fix.
fn internal(err: AccessError) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string())
}

async fn handle_health(State(ledger): State<SharedLedger>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        contracts: ledger.contract_count(),
        transactions: ledger.transaction_count(),
    })
}

async fn handle_deploy(
    State(ledger): State<SharedLedger>,
    Json(request): Json<DeployRequest>,
) -> Json<DeployResponse> {
    let address = ledger.deploy(request.owner);
    Json(DeployResponse {
        address,
        descriptor: ContractDescriptor::access_control(),
    })
}

async fn handle_contract_info(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
) -> Result<Json<ContractInfoResponse>, ApiError> {
    let (address, contract) = lookup(&ledger, &address)?;
    let owner = contract.owner().await.map_err(internal)?;
    let event_count = contract.events().await.map_err(internal)?.len() as u64;
    Ok(Json(ContractInfoResponse {
        address,
        descriptor: ContractDescriptor::access_control(),
        owner,
        event_count,
    }))
}

async fn handle_submit_tx(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
    Json(request): Json<SubmitTxRequest>,
) -> Result<Json<SubmitTxResponse>, ApiError> {
    let address = parse_address(&address)?;
    let tx_hash = ledger
        .submit(&address, &request.from, &request.call)
        .ok_or_else(|| ApiError::not_found(format!("no contract at {address}")))?;
    Ok(Json(SubmitTxResponse { tx_hash }))
}

async fn handle_get_receipt(
    State(ledger): State<SharedLedger>,
    Path(hash): Path<String>,
) -> Result<Json<TxReceipt>, ApiError> {
    let tx_hash = TxHash::from_hex(&hash).map_err(ApiError::bad_request)?;
    ledger
        .receipt(&tx_hash)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("transaction not found"))
}

async fn handle_access_file(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
    Json(request): Json<CallRequest>,
) -> Result<Json<AccessFileResponse>, ApiError> {
    let (_, contract) = lookup(&ledger, &address)?;
    let caller: Identity = match request.from.parse() {
        Ok(identity) => identity,
        Err(err) => {
            debug!(from = %request.from, "unresolvable caller refused: {}", err);
            return Err(ApiError::access_denied());
        }
    };
    match contract.access_file(&caller).await {
        Ok(fingerprint) => Ok(Json(AccessFileResponse { fingerprint })),
        Err(AccessError::AccessDenied) => Err(ApiError::access_denied()),
        Err(err) => Err(internal(err)),
    }
}

async fn handle_is_authorized(
    State(ledger): State<SharedLedger>,
    Path((address, identity)): Path<(String, String)>,
) -> Result<Json<AuthorizedResponse>, ApiError> {
    let (_, contract) = lookup(&ledger, &address)?;
    let identity = identity
        .parse::<Identity>()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    let authorized = contract.is_authorized(&identity).await.map_err(internal)?;
    Ok(Json(AuthorizedResponse {
        identity,
        authorized,
    }))
}

async fn handle_registration(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
) -> Result<Json<RegistrationResponse>, ApiError> {
    let (_, contract) = lookup(&ledger, &address)?;
    let registration = contract.registration().await.map_err(internal)?;
    Ok(Json(RegistrationResponse { registration }))
}

async fn handle_events(
    State(ledger): State<SharedLedger>,
    Path(address): Path<String>,
) -> Result<Json<EventsResponse>, ApiError> {
    let (_, contract) = lookup(&ledger, &address)?;
    let events = contract.events().await.map_err(internal)?;
    Ok(Json(EventsResponse { events }))
}
