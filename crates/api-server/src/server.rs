//! API server — HTTP REST plus a Prometheus metrics exporter.

use crate::auth;
use crate::handlers::{self, AppState};
use crate::router::desk_router;
use axum::routing::get;
use axum::Router;
use slotdesk_core::AppConfig;
use slotdesk_store::DeskStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Main API server for the dashboard backend.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<DeskStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<DeskStore>) -> Self {
        Self { config, store }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            store: self.store.clone(),
            reminders: self.config.reminders.clone(),
        };

        let app = Router::new()
            .merge(desk_router(state))
            // Operational endpoints
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness))
            .route("/live", get(handlers::liveness))
            // Middleware
            .layer(axum::middleware::from_fn(auth::auth_middleware))
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
