//! skybook - flight management server
//!
//! Serves flights, airplanes, schedules and bookings over a line-oriented
//! TCP command protocol.

use skybook_core::InMemoryFlightService;
use skybook_server::metrics::run_metrics_server;
use skybook_server::{Config, Metrics, Server, ServerConfig, ServerError};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Only an explicitly named config file can fail to load
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };
    if let Ok(path) = std::env::var("SKYBOOK_CONFIG") {
        tracing::info!("Loaded config from {}", path);
    }

    tracing::info!("Starting skybook server");
    tracing::info!("  Bind address: {}", config.network.bind_addr);

    let (metrics_shutdown, _) = broadcast::channel(1);
    let mut server_config = ServerConfig::new(config.network.bind_addr);
    if config.metrics.enabled {
        let metrics = Arc::new(Metrics::new()?);
        server_config = server_config.with_metrics(metrics.clone());

        let addr = config.metrics.bind_addr;
        let shutdown = metrics_shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = run_metrics_server(addr, metrics, shutdown).await {
                tracing::error!("Metrics server failed on {}: {}", addr, e);
            }
        });
        tracing::info!("  Metrics: enabled on {}", addr);
    } else {
        tracing::info!("  Metrics: disabled");
    }

    let server = Arc::new(Server::new(
        server_config,
        Arc::new(InMemoryFlightService::new()),
    ));

    let shutdown_server = server.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Received shutdown signal, stopping server...");
        shutdown_server.shutdown();
        let _ = metrics_shutdown.send(());
    });

    // Run server (blocks until shutdown)
    server.run().await?;

    tracing::info!("Server stopped");
    Ok(())
}
