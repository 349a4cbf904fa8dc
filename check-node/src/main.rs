//! nodecheckd binary entry point.
//!
//! Usage:
//! ```bash
//! nodecheckd --config nodecheck.toml
//! nodecheckd --help
//! ```

use anyhow::{Context, Result};
use check_node::{CheckNode, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Distributed self-diagnostics node daemon.
#[derive(Parser, Debug)]
#[command(name = "nodecheckd")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, default_value = "nodecheck.toml")]
    config: PathBuf,

    /// Override the node id from the configuration file
    #[arg(long)]
    node_id: Option<u32>,

    /// Override the admin listen address
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        Config::from_file(&cli.config)
            .with_context(|| format!("loading {}", cli.config.display()))?
    } else {
        tracing::warn!(path = %cli.config.display(), "Config file not found, using defaults");
        Config::default()
    };
    if let Some(node_id) = cli.node_id {
        config.node.node_id = node_id.into();
    }
    if let Some(bind) = cli.bind {
        config.node.admin_bind = bind;
    }
    config.validate().context("invalid configuration")?;

    let node = CheckNode::with_http_transport(config).context("building node")?;
    node.serve(shutdown_signal()).await.context("serving")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
