//! FileGuard simulation CLI
//!
//! `deploy` creates the access-control contract on a ledger and writes its
//! artifact; `run` drives the access simulation and saves the metrics.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fileguard_harness::{
    write_metrics, AccessSimulation, ContentBackend, LedgerBackend, LogFormat, Metrics,
    SimulationConfig, SimulationContext, SimulationPlan,
};
use fileguard_ledger::RpcAccessControl;
use fileguard_types::Identity;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "fileguard-sim", author, version, about = "FileGuard access simulation")]
struct Cli {
    /// Optional configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger base URL
    #[arg(long, global = true)]
    ledger_url: Option<String>,

    /// Contract artifact path
    #[arg(long, global = true)]
    artifact: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Deploy a fresh access-control contract and write its artifact
    Deploy {
        /// Devnet account index of the deployer (becomes the owner)
        #[arg(long)]
        owner_account: Option<u32>,
    },
    /// Run the access simulation and write the metrics artifact
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Trials per phase
    #[arg(long)]
    trials: Option<u64>,

    /// Discarded authorized reads before measuring
    #[arg(long)]
    warmup: Option<u64>,

    #[arg(long, value_enum)]
    ledger: Option<LedgerArg>,

    #[arg(long, value_enum)]
    content: Option<ContentArg>,

    /// IPFS HTTP API base URL
    #[arg(long)]
    ipfs_api: Option<String>,

    /// File registered during setup
    #[arg(long)]
    original: Option<PathBuf>,

    /// File checked against the registered fingerprint
    #[arg(long)]
    candidate: Option<PathBuf>,

    /// Metrics output path
    #[arg(long)]
    metrics: Option<PathBuf>,

    /// Cap on raw latency samples kept in memory
    #[arg(long)]
    max_retained_latencies: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LedgerArg {
    Memory,
    Rpc,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContentArg {
    Memory,
    Ipfs,
}

impl From<LedgerArg> for LedgerBackend {
    fn from(value: LedgerArg) -> Self {
        match value {
            LedgerArg::Memory => LedgerBackend::Memory,
            LedgerArg::Rpc => LedgerBackend::Rpc,
        }
    }
}

impl From<ContentArg> for ContentBackend {
    fn from(value: ContentArg) -> Self {
        match value {
            ContentArg::Memory => ContentBackend::Memory,
            ContentArg::Ipfs => ContentBackend::Ipfs,
        }
    }
}

impl RunArgs {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(trials) = self.trials {
            config.trials = trials;
        }
        if let Some(warmup) = self.warmup {
            config.warmup = warmup;
        }
        if let Some(ledger) = self.ledger {
            config.ledger_backend = ledger.into();
        }
        if let Some(content) = self.content {
            config.content_backend = content.into();
        }
        if let Some(ipfs_api) = &self.ipfs_api {
            config.ipfs_api = ipfs_api.clone();
        }
        if let Some(original) = &self.original {
            config.original_file = original.clone();
        }
        if let Some(candidate) = &self.candidate {
            config.candidate_file = candidate.clone();
        }
        if let Some(metrics) = &self.metrics {
            config.metrics_path = metrics.clone();
        }
        if let Some(cap) = self.max_retained_latencies {
            config.max_retained_latencies = cap;
        }
    }
}

fn init_logging(config: &SimulationConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Compact => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = SimulationConfig::load(cli.config.as_deref())?;
    if let Some(url) = &cli.ledger_url {
        config.ledger_url = url.clone();
    }
    if let Some(artifact) = &cli.artifact {
        config.artifact_path = artifact.clone();
    }

    match &cli.command {
        Commands::Deploy { owner_account } => {
            if let Some(owner) = owner_account {
                config.owner_account = *owner;
            }
            config.validate()?;
            init_logging(&config);
            deploy(&config).await
        }
        Commands::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            init_logging(&config);
            run(&config).await
        }
    }
}

async fn deploy(config: &SimulationConfig) -> Result<()> {
    let owner = Identity::account(config.owner_account);
    info!(ledger = %config.ledger_url, %owner, "deploying AccessControl");

    let artifact = RpcAccessControl::deploy(&config.ledger_url, &owner, config.rpc_options())
        .await
        .context("contract deployment failed")?;
    artifact
        .save(&config.artifact_path)
        .context("failed to write contract artifact")?;

    info!(
        address = %artifact.address,
        "contract deployed, artifact written to {}",
        config.artifact_path.display()
    );
    Ok(())
}

async fn run(config: &SimulationConfig) -> Result<()> {
    let ctx = SimulationContext::from_config(config)?;
    info!(
        owner = %ctx.participants.owner,
        authorized = %ctx.participants.authorized,
        unauthorized = %ctx.participants.unauthorized,
        "participants"
    );

    let simulation = AccessSimulation::new(ctx, SimulationPlan::from(config));
    let metrics = simulation.run().await?;
    write_metrics(&config.metrics_path, &metrics)?;
    print_summary(&metrics);
    Ok(())
}

fn print_summary(metrics: &Metrics) {
    println!("Trials per phase: {}", metrics.trials);
    match metrics.average_authorized_latency {
        Some(average) => println!("Average authorized latency: {:.4} s", average),
        None => println!("Average authorized latency: no data"),
    }
    if let Some(summary) = &metrics.latency_summary {
        println!(
            "p50 {:.4} s | p95 {:.4} s | p99 {:.4} s | max {:.4} s",
            summary.p50, summary.p95, summary.p99, summary.max
        );
    }
    println!(
        "Authorized failures: {} | transport errors: {}",
        metrics.authorized_failures, metrics.authorized_transport_errors
    );
    println!(
        "Unauthorized attempts: {} | blocked: {}",
        metrics.unauthorized_attempts, metrics.blocked_unauthorized_attempts
    );
    println!("Tamper detected: {}", metrics.tamper_detection);
}
