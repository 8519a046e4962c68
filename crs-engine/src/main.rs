//! CRS Engine - main entry point
//!
//! Document Quality & Lifecycle Engine service: initializes logging,
//! configuration and the database, builds the update hub, and serves the
//! per-session event stream.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crs_common::config::EngineConfig;
use crs_engine::{server, AppState};

/// Command-line arguments for crs-engine
#[derive(Parser, Debug)]
#[command(name = "crs-engine")]
#[command(about = "Document Quality & Lifecycle Engine service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5750", env = "CRS_ENGINE_PORT")]
    port: u16,

    /// SQLite database path (overrides config file)
    #[arg(short, long, env = "CRS_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crs_engine=debug,crs_common=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = EngineConfig::load().context("Failed to load configuration")?;
    if let Some(database) = args.database {
        config.database_path = database;
    }

    info!("Starting CRS engine on port {}", args.port);
    info!("Database: {}", config.database_path.display());

    let pool = crs_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool, config.keepalive_interval());
    let app = server::create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("CRS engine stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
