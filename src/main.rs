//! alder-node: run one node of the cluster.
//!
//! Two roles: a git-storage shard daemon serving lifecycle RPCs against
//! its repos directory, or the federation root's permission service. The
//! HTTP surface in front of the transport service is wired by the
//! embedding server, not here.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use alder::config::AppConfig;
use alder::gitserver::{CliGitRunner, ShardDaemon};
use alder::{rpc, store};

#[derive(Debug, Parser)]
#[command(name = "alder-node", about = "Sharded git hosting control plane node")]
struct Args {
    /// Path to a TOML config file; environment variables are used when
    /// absent.
    #[arg(long, env = "ALDER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a git-storage shard daemon.
    Shard,
    /// Run the federation root's permission service.
    Root,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::load()?,
    };

    let listen_addr = config
        .cluster
        .listen_addr
        .clone()
        .context("cluster.listen_addr is required to serve")?;
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;

    match args.command {
        Command::Shard => {
            let daemon = Arc::new(ShardDaemon::new(
                config.storage.repos_dir.clone(),
                Arc::new(CliGitRunner),
            ));
            info!(
                addr = %listen_addr,
                repos_dir = %config.storage.repos_dir.display(),
                "shard daemon listening"
            );
            rpc::serve_shard(listener, daemon).await?;
        }
        Command::Root => {
            info!(addr = %listen_addr, "root permission service listening");
            rpc::serve_root(listener, store::user_store()).await?;
        }
    }
    Ok(())
}
