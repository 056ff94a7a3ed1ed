//! SlotDesk — administrative dashboard backend for shared streaming-service
//! accounts: slots rented to subscribers, subscriptions with date ranges and
//! pricing, and payment tracking.
//!
//! Main entry point that initializes the store and starts the server.

use clap::Parser;
use slotdesk_api::ApiServer;
use slotdesk_core::AppConfig;
use slotdesk_store::DeskStore;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "slotdesk")]
#[command(about = "Administrative dashboard backend for shared streaming accounts")]
#[command(version)]
struct Cli {
    /// HTTP port (overrides config)
    #[arg(long, env = "SLOTDESK__API__HTTP_PORT")]
    http_port: Option<u16>,

    /// Metrics port (overrides config)
    #[arg(long, env = "SLOTDESK__METRICS__PORT")]
    metrics_port: Option<u16>,

    /// Load demo data on startup
    #[arg(long, default_value_t = false)]
    seed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slotdesk=info,tower_http=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("SlotDesk starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(port) = cli.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = cli.metrics_port {
        config.metrics.port = port;
    }

    info!(
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        "Configuration loaded"
    );

    // Initialize the store
    let store = Arc::new(DeskStore::new());
    if cli.seed {
        store.seed_demo_data();
    }

    let api_server = ApiServer::new(config, store);

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    info!("SlotDesk is ready to serve traffic");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
