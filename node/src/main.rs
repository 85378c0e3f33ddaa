use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use config::{Config, File as ConfigFile};
use fileguard_ledger::{start_server, DevnetLedger, DEFAULT_RECEIPT_RETENTION};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod version;

use version::{git_commit_hash, FILEGUARD_VERSION};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct NodeConfig {
    listen_addr: String,
    /// How long receipts stay pending after submission.
    confirmation_delay_ms: u64,
    /// Receipts kept before the oldest are evicted.
    receipt_retention: usize,
    log_level: String,
    log_format: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8545".to_string(),
            confirmation_delay_ms: 0,
            receipt_retention: DEFAULT_RECEIPT_RETENTION,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
        }
    }
}

impl NodeConfig {
    fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(anyhow!("config file {} does not exist", path.display()));
            }
            builder = builder.add_source(ConfigFile::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("FILEGUARD").try_parsing(true));

        let config: NodeConfig = builder.build()?.try_deserialize()?;
        match config.log_format.as_str() {
            "pretty" | "compact" => Ok(config),
            other => Err(anyhow!("unsupported log_format {other:?}, expected pretty or compact")),
        }
    }
}

fn cli() -> Command {
    Command::new("fileguard-node")
        .version(FILEGUARD_VERSION)
        .about("FileGuard devnet ledger node")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .value_name("ADDR")
                .help("Address to serve the ledger API on"),
        )
        .arg(
            Arg::new("confirmation-delay-ms")
                .long("confirmation-delay-ms")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .help("Delay before submitted transactions become final"),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .action(ArgAction::SetTrue)
                .help("Validate configuration and exit"),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let mut config = NodeConfig::load(config_path.as_deref())?;
    if let Some(listen) = matches.get_one::<String>("listen") {
        config.listen_addr = listen.clone();
    }
    if let Some(delay) = matches.get_one::<u64>("confirmation-delay-ms") {
        config.confirmation_delay_ms = *delay;
    }

    if matches.get_flag("check") {
        println!("configuration ok: {config:?}");
        return Ok(());
    }

    init_logging(&config)?;
    info!(
        version = FILEGUARD_VERSION,
        commit = git_commit_hash(),
        "starting FileGuard devnet ledger"
    );
    if config.confirmation_delay_ms > 0 {
        info!("receipts finalize after {} ms", config.confirmation_delay_ms);
    }

    let ledger = Arc::new(
        DevnetLedger::with_confirmation_delay(Duration::from_millis(config.confirmation_delay_ms))
            .with_receipt_retention(config.receipt_retention),
    );

    tokio::select! {
        result = start_server(ledger, &config.listen_addr) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("shutdown signal received");
            Ok(())
        }
    }
}

fn init_logging(config: &NodeConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:8545");
        assert_eq!(config.confirmation_delay_ms, 0);
        assert_eq!(config.receipt_retention, DEFAULT_RECEIPT_RETENTION);
    }

    #[test]
    fn test_config_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "listen_addr = \"0.0.0.0:9000\"\nconfirmation_delay_ms = 250\nreceipt_retention = 500"
        )
        .unwrap();

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.confirmation_delay_ms, 250);
        assert_eq!(config.receipt_retention, 500);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_missing_config_file() {
        assert!(NodeConfig::load(Some(Path::new("/nonexistent/node.toml"))).is_err());
    }

    #[test]
    fn test_cli_parses_overrides() {
        let matches = cli()
            .try_get_matches_from(["fileguard-node", "--listen", "0.0.0.0:1", "--check"])
            .unwrap();
        assert_eq!(matches.get_one::<String>("listen").unwrap(), "0.0.0.0:1");
        assert!(matches.get_flag("check"));
    }
}
