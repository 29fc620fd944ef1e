//! CleanChain daemon: entry point for running a CleanChain node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use cleanchain_geo::GeoValidator;
use cleanchain_node::{
    init_logging, CleanChainNode, LogFormat, NodeConfig, ShutdownController, StoreBackend,
};
use cleanchain_rpc::{RpcServer, RpcState};
use cleanchain_types::{Coordinates, LocationId, TxId};

#[derive(Parser)]
#[command(name = "cleanchain-daemon", about = "CleanChain location lifecycle node")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CLEANCHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "CLEANCHAIN_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Storage backend.
    #[arg(long, value_enum, env = "CLEANCHAIN_STORE")]
    store: Option<Backend>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "CLEANCHAIN_RPC_HOST")]
    rpc_host: Option<String>,

    /// HTTP API port.
    #[arg(long, env = "CLEANCHAIN_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Enable the Prometheus metrics endpoint.
    #[arg(long, env = "CLEANCHAIN_ENABLE_METRICS")]
    metrics: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CLEANCHAIN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CLEANCHAIN_LOG_FORMAT")]
    log_format: Option<String>,

    /// Token ledger gateway URL.
    #[arg(long, env = "CLEANCHAIN_LEDGER_ENDPOINT")]
    ledger_endpoint: Option<String>,

    /// Bearer token for the ledger gateway.
    #[arg(long, env = "CLEANCHAIN_LEDGER_API_KEY", hide_env_values = true)]
    ledger_api_key: Option<String>,

    /// Webhook receiving claim and reward notifications.
    #[arg(long, env = "CLEANCHAIN_WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// TOML file of locations inserted at startup.
    #[arg(long, env = "CLEANCHAIN_SEED_FILE")]
    seed_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    Memory,
    Lmdb,
}

impl From<Backend> for StoreBackend {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Memory => StoreBackend::Memory,
            Backend::Lmdb => StoreBackend::Lmdb,
        }
    }
}

#[derive(clap::Subcommand)]
enum Command {
    /// Start the node.
    #[command(name = "node")]
    Node {
        #[command(subcommand)]
        action: NodeAction,
    },
    /// Inspect and settle rewards left in flight.
    #[command(name = "reconcile")]
    Reconcile {
        #[command(subcommand)]
        action: ReconcileAction,
    },
    /// Print the distance between two points and whether it is within the claim radius.
    #[command(name = "distance")]
    Distance {
        #[arg(long, allow_hyphen_values = true)]
        lat1: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng1: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat2: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng2: f64,
    },
    /// Print the effective configuration as TOML.
    #[command(name = "config")]
    Config,
}

#[derive(clap::Subcommand)]
enum NodeAction {
    /// Run the node.
    Run,
}

#[derive(clap::Subcommand)]
enum ReconcileAction {
    /// List locations whose reward is in flight.
    List,
    /// Retry the ledger transfer for one location.
    Retry {
        #[arg(long)]
        location: String,
    },
    /// Record a transfer the ledger is known to have executed.
    Confirm {
        #[arg(long)]
        location: String,
        #[arg(long)]
        tx_id: String,
    },
}

impl Cli {
    /// File config (or defaults) with CLI flags and env vars layered on top.
    fn effective_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("failed to load config file {path}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(store) = self.store {
            config.store = store.into();
        }
        if let Some(host) = &self.rpc_host {
            config.rpc_host = host.clone();
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        config.enable_metrics |= self.metrics;
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        if let Some(endpoint) = &self.ledger_endpoint {
            config.ledger.endpoint = Some(endpoint.clone());
        }
        if let Some(key) = &self.ledger_api_key {
            config.ledger.api_key = Some(key.clone());
        }
        if let Some(url) = &self.webhook_url {
            config.notifier.webhook_url = Some(url.clone());
        }
        if let Some(seed) = &self.seed_file {
            config.seed_file = Some(seed.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.effective_config()?;

    match cli.command {
        Command::Node {
            action: NodeAction::Run,
        } => run_node(config).await,
        Command::Reconcile { action } => reconcile(config, action).await,
        Command::Distance {
            lat1,
            lng1,
            lat2,
            lng2,
        } => {
            let geo = GeoValidator::new(config.params.claim_radius_m);
            let report = geo.check(Coordinates::new(lat1, lng1)?, Coordinates::new(lat2, lng2)?);
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_node(config: NodeConfig) -> anyhow::Result<()> {
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    tracing::info!(
        store = ?config.store,
        data_dir = %config.data_dir.display(),
        rpc = %format!("{}:{}", config.rpc_host, config.rpc_port),
        metrics = config.enable_metrics,
        "starting CleanChain node"
    );

    let node = CleanChainNode::new(config.clone())?;
    let shutdown = Arc::new(ShutdownController::new());
    let server = RpcServer::new(
        config.rpc_host.clone(),
        config.rpc_port,
        RpcState {
            engine: node.engine(),
            enable_metrics: config.enable_metrics,
        },
    );

    let signals = shutdown.clone();
    tokio::spawn(async move { signals.wait_for_signal().await });

    server.start(shutdown.signalled()).await?;
    tracing::info!("CleanChain daemon exited cleanly");
    Ok(())
}

async fn reconcile(config: NodeConfig, action: ReconcileAction) -> anyhow::Result<()> {
    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;

    let node = CleanChainNode::new(config)?;
    let engine = node.engine();

    match action {
        ReconcileAction::List => {
            let in_flight = engine.list_in_flight()?;
            println!("{}", serde_json::to_string_pretty(&in_flight)?);
        }
        ReconcileAction::Retry { location } => {
            let id = LocationId::parse(location)?;
            let result = engine.retry_in_flight(&id).await?;
            println!("{id}: {result:?}");
        }
        ReconcileAction::Confirm { location, tx_id } => {
            let id = LocationId::parse(location)?;
            let result = engine.confirm_in_flight(&id, TxId::new(tx_id)).await?;
            println!("{id}: {result:?}");
        }
    }
    Ok(())
}
