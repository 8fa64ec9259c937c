//! jukevote-server - shared playlist where listeners add songs and vote
//!
//! Serves the voting page and its JSON API from one process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jukevote_common::config::{Config, ConfigOverrides, StorageBackend};
use jukevote_common::{MemoryStore, SongStore, SqliteStore};
use jukevote_server::{build_router, AppState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
///
/// Unset options fall back to JUKEVOTE_* environment variables, then the
/// config file, then built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "jukevote-server")]
#[command(about = "Collaborative song voting service")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Storage backend: memory or sqlite
    #[arg(short, long)]
    storage: Option<StorageBackend>,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Log filter, e.g. "debug" or "jukevote_server=debug,tower_http=info"
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_file: args.config,
            storage: args.storage,
            database_path: args.database,
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cli_log_level = args.log_level.is_some();

    let config = Config::resolve(args.into()).context("Failed to load configuration")?;

    // --log-level beats RUST_LOG, which beats the config file
    let filter = if cli_log_level {
        EnvFilter::try_new(&config.log_level)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))
    }
    .with_context(|| format!("Invalid log filter: {}", config.log_level))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting jukevote-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config.config_file {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => info!("No config file, using environment and defaults"),
    }

    let store: Arc<dyn SongStore> = match config.storage {
        StorageBackend::Memory => {
            warn!("Using in-memory storage; songs are lost when the server stops");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Sqlite => {
            info!("Database path: {}", config.database_path.display());
            match SqliteStore::open(&config.database_path).await {
                Ok(store) => {
                    info!("✓ Database ready");
                    Arc::new(store)
                }
                Err(e) => {
                    error!("Failed to open database: {}", e);
                    return Err(e.into());
                }
            }
        }
    };

    let app = build_router(AppState::new(store));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("jukevote-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
