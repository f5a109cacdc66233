//! covlink-edi - Cover auto-linking reconciliation service
//!
//! Discovers insurance cover memberships the legacy EDI system holds for a
//! phone number and attempts to attach them to the user's profile,
//! appending an audit trail and filing manual-review tickets for
//! unrecoverable rejections.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use covlink_common::config::{ConfigOverrides, ServiceConfig};
use covlink_edi::services::edi_client::EdiClient;
use covlink_edi::{build_router, AppState};

/// Command-line arguments for covlink-edi
#[derive(Parser, Debug)]
#[command(name = "covlink-edi")]
#[command(about = "Cover auto-linking reconciliation service")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "COVLINK_PORT")]
    port: Option<u16>,

    /// Path to the SQLite database file
    #[arg(short, long, env = "COVLINK_DATABASE")]
    database: Option<PathBuf>,

    /// Base URL of the EDI integration gateway
    #[arg(long, env = "COVLINK_EDI_BASE_URL")]
    edi_base_url: Option<String>,

    /// Outbound request timeout in seconds
    #[arg(long, env = "COVLINK_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: Option<u64>,

    /// Path to a TOML config file
    #[arg(short, long, env = "COVLINK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "covlink_edi=info,tower_http=info".into()),
        )
        .init();

    info!(
        "Starting covlink-edi v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::resolve(ConfigOverrides {
        config_file: args.config,
        database_path: args.database,
        port: args.port,
        edi_base_url: args.edi_base_url,
        request_timeout_secs: args.request_timeout_secs,
    })?;

    info!("Database: {}", config.database_path.display());
    info!("EDI gateway: {}", config.edi_base_url);

    let pool = covlink_edi::db::init_database_pool(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let edi = EdiClient::new(
        &config.edi_base_url,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to create EDI client")?;

    let state = AppState::new(pool, edi);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("covlink-edi listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        }
    }
}
