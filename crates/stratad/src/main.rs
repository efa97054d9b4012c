//! `stratad`, the Strata daemon.
//!
//! Opens a ledger over a Fjall (or in-memory) log and serves it through the
//! HTTP gateway.
//!
//! # Usage
//!
//! ```text
//! stratad start                               # serve ~/.strata
//! stratad start -c strata.toml                # start with a config file
//! stratad start -d ./node2 -l 127.0.0.1:3324  # second instance
//! stratad start --memory                      # nothing persisted
//! stratad root                                # print the current root
//! stratad audit                               # re-hash the whole log
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use strata_gateway::{GatewayConfig, GatewayServer};
use strata_ledger::Ledger;
use strata_log::{AppendLog, FjallLog, MemoryLog};
use tracing::{error, info, warn};

use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "stratad", version, about = "Strata tamper-evident ledger daemon")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    config: Option<PathBuf>,

    /// Override data directory.
    #[arg(short, long, global = true, env = "STRATA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the ledger and serve the HTTP gateway.
    Start {
        /// Override gateway listen address (e.g. "127.0.0.1:3324").
        #[arg(short = 'l', long, env = "STRATA_LISTEN_ADDR")]
        listen_addr: Option<String>,

        /// Bearer token required on every request.
        #[arg(long, env = "STRATA_AUTH_TOKEN")]
        auth_token: Option<String>,

        /// Run fully in-memory (no disk persistence).
        #[arg(short, long)]
        memory: bool,
    },

    /// Print the current root of the on-disk ledger.
    Root,

    /// Re-read and re-hash every entry, then print the verified root.
    Audit,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if let Some(dir) = cli.data_dir {
        config.node.data_dir = dir;
    }

    match cli.command {
        Commands::Start {
            listen_addr,
            auth_token,
            memory,
        } => {
            if let Some(addr) = listen_addr {
                config.node.listen_addr = addr;
            }
            if auth_token.is_some() {
                config.gateway.auth_token = auth_token;
            }
            if memory {
                config.storage.backend = "memory".to_string();
            }
            cmd_start(config).await
        }
        Commands::Root => cmd_root(&config),
        Commands::Audit => cmd_audit(&config),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Open the configured log backend and the ledger over it.
fn open_ledger(config: &CliConfig) -> Result<Ledger> {
    let log: Arc<dyn AppendLog> = match config.storage.backend.as_str() {
        "memory" => {
            warn!("memory backend: nothing will be persisted");
            Arc::new(MemoryLog::new())
        }
        "fjall" => {
            let dir = config.log_dir();
            std::fs::create_dir_all(&dir).context("failed to create data directory")?;
            let log = FjallLog::open(&dir, config.storage.sync_writes).map_err(|e| {
                error!(path = %dir.display(), %e, "failed to open log");
                anyhow::anyhow!("cannot open log at {}: {e}", dir.display())
            })?;
            Arc::new(log)
        }
        other => anyhow::bail!("unknown storage backend {other:?} (expected \"fjall\" or \"memory\")"),
    };

    Ledger::open(log, config.ledger_config()).context("failed to open ledger")
}

// -----------------------------------------------------------------------
// stratad start
// -----------------------------------------------------------------------

async fn cmd_start(config: CliConfig) -> Result<()> {
    info!("starting stratad");
    info!(
        data_dir = %config.node.data_dir.display(),
        addr = %config.node.listen_addr,
        backend = %config.storage.backend,
        sync_writes = config.storage.sync_writes,
        "node configuration"
    );

    let ledger = Arc::new(open_ledger(&config)?);
    let root = ledger.current_root();
    info!(
        size = root.size,
        root = %root.hash,
        max_reference_depth = ledger.config().max_reference_depth,
        "ledger ready"
    );

    let server = GatewayServer::new(GatewayConfig {
        ledger,
        auth_token: config.gateway.auth_token.clone(),
        max_body_bytes: config.max_body_bytes(),
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(%e, "failed to listen for ctrl-c");
        }
        info!("shutdown requested");
    };

    server
        .serve_with_shutdown(&config.node.listen_addr, shutdown)
        .await
        .context("gateway failed")?;

    info!("stratad stopped");
    Ok(())
}

// -----------------------------------------------------------------------
// stratad root / audit
// -----------------------------------------------------------------------

/// Open the on-disk ledger for an offline command.
fn open_stored_ledger(config: &CliConfig, command: &str) -> Result<Ledger> {
    if config.memory_mode() {
        anyhow::bail!("`stratad {command}` reads the on-disk log; the memory backend has none");
    }
    open_ledger(config)
}

fn cmd_root(config: &CliConfig) -> Result<()> {
    let ledger = open_stored_ledger(config, "root")?;
    let root = ledger.current_root();
    println!("size: {}", root.size);
    println!("hash: {}", root.hash);
    Ok(())
}

fn cmd_audit(config: &CliConfig) -> Result<()> {
    let ledger = open_stored_ledger(config, "audit")?;
    let root = ledger.audit().context("audit failed")?;
    println!("audit passed");
    println!("size: {}", root.size);
    println!("hash: {}", root.hash);
    Ok(())
}
