//! # relayd
//!
//! Relay chat server binary — loads settings, opens the message store,
//! pre-loads history, and serves the WebSocket relay until ctrl-c.

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use relay_server::config::ServerConfig;
use relay_server::server::RelayServer;
use relay_settings::RelaySettings;
use relay_store::{new_file, run_migrations, ConnectionConfig, MessageStore};
use tracing_subscriber::EnvFilter;

/// Relay chat server.
#[derive(Parser, Debug)]
#[command(name = "relayd", about = "Relay chat server")]
struct Cli {
    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings; 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` message database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Maximum number of messages kept in history (overrides settings).
    #[arg(long)]
    max_history: Option<usize>,

    /// Disable message persistence entirely.
    #[arg(long)]
    no_persist: bool,
}

/// Resolve a settings-relative database path under `~/.relay`.
fn resolve_db_path(db_path: &str) -> PathBuf {
    let path = PathBuf::from(db_path);
    if path.is_absolute() {
        return path;
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".relay").join(path)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Open the message database and apply migrations.
fn open_store(path: &Path) -> Result<MessageStore> {
    let pool = new_file(&path.to_string_lossy(), &ConnectionConfig::default())
        .context("Failed to open message database")?;
    {
        let conn = pool.get().context("Failed to get store connection")?;
        run_migrations(&conn).context("Failed to run store migrations")?;
    }
    Ok(MessageStore::new(pool))
}

/// Merge CLI flags over loaded settings.
fn build_config(args: &Cli, settings: &RelaySettings) -> ServerConfig {
    ServerConfig {
        host: args
            .host
            .clone()
            .unwrap_or_else(|| settings.server.host.clone()),
        port: args.port.unwrap_or(settings.server.port),
        max_history: args.max_history.unwrap_or(settings.server.max_history),
        send_queue_size: settings.server.send_queue_size,
        max_message_size: settings.server.max_message_size,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = relay_settings::load_settings().unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.logging.level.as_filter_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let store = if args.no_persist || !settings.storage.enabled {
        tracing::info!("persistence disabled, running in-memory only");
        None
    } else {
        let db_path = args
            .db_path
            .clone()
            .unwrap_or_else(|| resolve_db_path(&settings.storage.db_path));
        ensure_parent_dir(&db_path)?;
        tracing::info!(path = %db_path.display(), "opening message database");
        Some(Arc::new(open_store(&db_path)?))
    };

    let config = build_config(&args, &settings);
    let max_history = config.max_history;
    let server = RelayServer::new(config, store.clone());

    if let Some(store) = &store {
        let recent = store
            .recent(max_history)
            .context("Failed to load recent messages")?;
        tracing::info!(count = recent.len(), "preloaded message history");
        server.history().preload(recent);
    }

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("relay listening on http://{addr}");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("shutting down...");
    server
        .shutdown()
        .drain(vec![handle], Duration::from_secs(10))
        .await;
    tracing::info!("shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
