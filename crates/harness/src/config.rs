//! Simulation settings
//!
//! Loaded from an optional config file, then `FILEGUARD_*` environment
//! variables. Command-line overrides are applied by the caller afterwards.

use crate::errors::{Result, SimulationError};
use config::{Config, Environment, File as ConfigFile};
use fileguard_ledger::RpcOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "FILEGUARD";

/// Which access-control implementation the simulation drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerBackend {
    /// In-process state machine, no network.
    Memory,
    /// Contract deployed on a ledger reachable at `ledger_url`.
    Rpc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    Memory,
    Ipfs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Trials per phase.
    pub trials: u64,
    /// Authorized reads issued before measuring; outcomes are discarded.
    pub warmup: u64,
    pub max_retained_latencies: usize,

    pub ledger_backend: LedgerBackend,
    pub content_backend: ContentBackend,
    pub ledger_url: String,
    pub ipfs_api: String,
    pub artifact_path: PathBuf,
    pub metrics_path: PathBuf,
    pub original_file: PathBuf,
    pub candidate_file: PathBuf,

    /// Devnet account indices.
    pub owner_account: u32,
    pub authorized_account: u32,
    pub unauthorized_account: u32,

    pub request_timeout_secs: u64,
    pub finality_timeout_secs: u64,
    pub poll_interval_ms: u64,

    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: 1000,
            warmup: 0,
            max_retained_latencies: 1_000_000,
            ledger_backend: LedgerBackend::Rpc,
            content_backend: ContentBackend::Ipfs,
            ledger_url: "http://127.0.0.1:8545".to_string(),
            ipfs_api: "http://127.0.0.1:5001".to_string(),
            artifact_path: PathBuf::from("AccessControl.json"),
            metrics_path: PathBuf::from("metrics.json"),
            original_file: PathBuf::from("origin_data/test_upload_file.txt"),
            candidate_file: PathBuf::from("changed_data/test_upload_file.txt"),
            owner_account: 0,
            authorized_account: 1,
            unauthorized_account: 2,
            request_timeout_secs: 10,
            finality_timeout_secs: 30,
            poll_interval_ms: 50,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(ConfigFile::from(path));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let settings: SimulationConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(SimulationError::Config(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.max_retained_latencies == 0 {
            return Err(SimulationError::Config(
                "max_retained_latencies must be greater than zero".into(),
            ));
        }
        if self.ledger_backend == LedgerBackend::Rpc && self.ledger_url.trim().is_empty() {
            return Err(SimulationError::Config(
                "ledger_url is required for the rpc backend".into(),
            ));
        }
        if self.content_backend == ContentBackend::Ipfs && self.ipfs_api.trim().is_empty() {
            return Err(SimulationError::Config(
                "ipfs_api is required for the ipfs backend".into(),
            ));
        }
        let accounts = [
            self.owner_account,
            self.authorized_account,
            self.unauthorized_account,
        ];
        if accounts[0] == accounts[1] || accounts[0] == accounts[2] || accounts[1] == accounts[2] {
            return Err(SimulationError::Config(
                "owner, authorized and unauthorized accounts must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn rpc_options(&self) -> RpcOptions {
        RpcOptions {
            request_timeout: self.request_timeout(),
            finality_timeout: Duration::from_secs(self.finality_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }
}
