//! RPC adapter against a devnet ledger served on an ephemeral port.

use fileguard_access::{AccessControl, AccessError, ErrorKind};
use fileguard_ledger::{serve, DevnetLedger, RpcAccessControl, RpcOptions};
use fileguard_types::{ContractArtifact, ContractEvent, Identity, TxStatus};
use std::sync::Arc;
use std::time::Duration;

fn fast_options() -> RpcOptions {
    RpcOptions {
        request_timeout: Duration::from_secs(5),
        finality_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(5),
    }
}

async fn spawn_ledger(ledger: DevnetLedger) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, Arc::new(ledger)));
    format!("http://{addr}")
}

async fn deployed(ledger: DevnetLedger) -> (RpcAccessControl, Identity) {
    let url = spawn_ledger(ledger).await;
    let owner = Identity::account(0);
    let artifact = RpcAccessControl::deploy(&url, &owner, fast_options())
        .await
        .unwrap();
    let contract = RpcAccessControl::from_artifact(url, &artifact, fast_options()).unwrap();
    (contract, owner)
}

#[tokio::test]
async fn test_authorized_read_over_rpc() {
    let (contract, owner) = deployed(DevnetLedger::new()).await;
    let user = Identity::account(1);

    let receipt = contract.register_content(&owner, "Qm123").await.unwrap();
    assert_eq!(receipt.status, TxStatus::Finalized);
    contract.grant_access(&owner, &user).await.unwrap();

    assert!(contract.is_authorized(&user).await.unwrap());
    assert_eq!(contract.access_file(&user).await.unwrap().as_str(), "Qm123");
    assert_eq!(contract.access_file(&owner).await.unwrap().as_str(), "Qm123");
}

#[tokio::test]
async fn test_unauthorized_read_and_write_over_rpc() {
    let (contract, owner) = deployed(DevnetLedger::new()).await;
    let attacker = Identity::account(2);
    contract.register_content(&owner, "Qm123").await.unwrap();

    let err = contract.access_file(&attacker).await.unwrap_err();
    assert_eq!(err, AccessError::AccessDenied);

    let err = contract.grant_access(&attacker, &attacker).await.unwrap_err();
    assert_eq!(err, AccessError::Unauthorized { caller: attacker });
    assert!(!contract.is_authorized(&attacker).await.unwrap());
}

#[tokio::test]
async fn test_invalid_fingerprint_reverts() {
    let (contract, owner) = deployed(DevnetLedger::new()).await;
    let err = contract.register_content(&owner, "").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(contract.registration().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fingerprint_is_opaque_over_rpc() {
    let (contract, owner) = deployed(DevnetLedger::new()).await;
    contract.register_content(&owner, "Qm 123").await.unwrap();
    let fingerprint = contract.access_file(&owner).await.unwrap();
    assert_eq!(fingerprint.as_str(), "Qm 123");
}

#[tokio::test]
async fn test_writes_wait_for_confirmation() {
    let delay = Duration::from_millis(120);
    let (contract, owner) = deployed(DevnetLedger::with_confirmation_delay(delay)).await;

    let started = std::time::Instant::now();
    contract.register_content(&owner, "Qm123").await.unwrap();
    assert!(started.elapsed() >= delay);
}

#[tokio::test]
async fn test_finality_timeout_is_transport_error() {
    let url = spawn_ledger(DevnetLedger::with_confirmation_delay(Duration::from_secs(3600))).await;
    let owner = Identity::account(0);
    let options = RpcOptions {
        finality_timeout: Duration::from_millis(50),
        ..fast_options()
    };
    let artifact = RpcAccessControl::deploy(&url, &owner, options).await.unwrap();
    let contract = RpcAccessControl::from_artifact(url, &artifact, options).unwrap();

    let err = contract.register_content(&owner, "Qm123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_revoke_and_event_log_over_rpc() {
    let (contract, owner) = deployed(DevnetLedger::new()).await;
    let user = Identity::account(1);

    contract.register_content(&owner, "Qm123").await.unwrap();
    contract.grant_access(&owner, &user).await.unwrap();
    contract.revoke_access(&owner, &user).await.unwrap();

    assert!(matches!(
        contract.access_file(&user).await,
        Err(AccessError::AccessDenied)
    ));
    assert_eq!(contract.owner().await.unwrap(), owner);

    let events = contract.events().await.unwrap();
    let sequences: Vec<u64> = events.iter().map(|record| record.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(
        events[2].event,
        ContractEvent::AccessRevoked { subject: user }
    );
}

#[tokio::test]
async fn test_deploy_artifact_round_trip() {
    let url = spawn_ledger(DevnetLedger::new()).await;
    let owner = Identity::account(0);
    let artifact = RpcAccessControl::deploy(&url, &owner, fast_options())
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("AccessControl.json");
    artifact.save(&path).unwrap();
    let loaded = ContractArtifact::load(&path).unwrap();
    assert_eq!(loaded, artifact);

    let contract = RpcAccessControl::from_artifact(url, &loaded, fast_options()).unwrap();
    let health = contract.health().await.unwrap();
    assert_eq!(health.contracts, 1);
    assert_eq!(contract.info().await.unwrap().owner, owner);
}
