//! Geo Overlay server
//!
//! Hosts the map session behind the HTTP API and keeps the radar timeline
//! fresh in the background.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use geo_overlay::api::{create_router, AppState};
use geo_overlay::timeline::RefreshOutcome;
use geo_overlay::{spawn_radar_refresh_task, Config};

/// Main entry point for the Geo Overlay server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the map session on the HTTP service adapters
/// 4. Load the first radar frame list and discover the secondary overlay
/// 5. Start the background radar refresh task
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geo_overlay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Geo Overlay server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}, cache_ttl={}s, port={}, radar_refresh={}s",
        config.cache_capacity, config.cache_ttl_secs, config.server_port, config.radar_refresh_secs
    );

    let state = AppState::from_config(&config).context("building upstream service clients")?;
    info!("Map session initialized");

    // Neither failure is fatal: the timeline starts empty, the overlay is omitted.
    match state.session.timeline().refresh().await {
        Ok(RefreshOutcome::Replaced { frames, .. }) => info!("Loaded {} radar frames", frames),
        Ok(outcome) => warn!("Initial radar refresh: {:?}", outcome),
        Err(e) => warn!("Initial radar refresh failed: {}", e),
    }
    state.session.discover_overlay().await;

    let refresh_handle =
        spawn_radar_refresh_task(state.session.timeline().clone(), config.radar_refresh_secs);
    info!("Background radar refresh task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(refresh_handle))
        .await
        .context("serving HTTP")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the refresh task and allows graceful shutdown.
async fn shutdown_signal(refresh_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    refresh_handle.abort();
    warn!("Radar refresh task aborted");
}
