//! Tally daemon: entry point for running the governance vote indexer.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tally_node::{init_logging, NodeConfig, TallyNode};

#[derive(Parser)]
#[command(name = "tally-daemon", about = "Governance vote indexer daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "TALLY_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory for the LMDB store.
    #[arg(long, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Enable or disable the read API.
    #[arg(long, env = "TALLY_ENABLE_RPC")]
    rpc: Option<bool>,

    /// Read API port.
    #[arg(long, env = "TALLY_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Expose Prometheus metrics at /metrics.
    #[arg(long, env = "TALLY_ENABLE_METRICS")]
    metrics: bool,

    /// IPFS HTTP gateway for proposal content and vote payloads.
    #[arg(long, env = "TALLY_IPFS_GATEWAY")]
    ipfs_gateway: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TALLY_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TALLY_LOG_FORMAT")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the indexer until SIGINT/SIGTERM.
    Run,
    /// Validate the resolved configuration and print it.
    CheckConfig,
    /// Print the default configuration as TOML.
    DefaultConfig,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config from {path}"))?
            }
            None => NodeConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.data_dir = data_dir.clone();
        }
        if let Some(rpc) = self.rpc {
            config.enable_rpc = rpc;
        }
        if let Some(port) = self.rpc_port {
            config.rpc_port = port;
        }
        config.enable_metrics |= self.metrics;
        if let Some(gateway) = &self.ipfs_gateway {
            config.ipfs_gateway = gateway.clone();
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::DefaultConfig => {
            print!("{}", NodeConfig::default().to_toml_string()?);
        }
        Command::CheckConfig => {
            let config = cli.resolve_config()?;
            config.validate()?;
            print!("{}", config.to_toml_string()?);
        }
        Command::Run => {
            let config = cli.resolve_config()?;
            config.validate()?;
            init_logging(config.log_format()?, &config.log_level)?;

            tracing::info!(
                data_dir = %config.data_dir.display(),
                networks = config.networks.len(),
                rpc = %if config.enable_rpc {
                    config.rpc_port.to_string()
                } else {
                    "off".into()
                },
                "starting tally daemon"
            );
            for network in &config.networks {
                tracing::info!(
                    network = %network.id,
                    name = %network.label(),
                    rpc_url = %network.rpc_url,
                    voting_contract = %network.voting_contract,
                    "indexing network"
                );
            }

            let mut node = TallyNode::new(config)?;
            node.run_until_signal().await?;

            tracing::info!("shutdown signal received, stopping node");
            node.stop().await?;

            tracing::info!("tally daemon exited cleanly");
        }
    }

    Ok(())
}
