//! Post Ranker - An aggregation backend over an upstream users/posts API
//!
//! Serves `/users` and `/posts`, backed by the upstream configured in the
//! environment.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use post_ranker::api::create_router;
use post_ranker::{AppState, Config};

/// Main entry point for the aggregation server.
///
/// # Startup Sequence
/// 1. Load `.env` if present
/// 2. Initialize tracing subscriber for logging
/// 3. Load configuration from environment variables
/// 4. Build the upstream client, cache and aggregator
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply
    dotenv::dotenv().ok();

    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "post_ranker=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Post Ranker");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        "Configuration loaded: upstream={}, port={}, users_ttl={}s, timeout={}s, fanout={}",
        config.api_base_url,
        config.server_port,
        config.users_cache_ttl,
        config.upstream_timeout,
        config.fanout_limit
    );

    let state = AppState::from_config(&config).context("Failed to build upstream client")?;
    info!("Cache and upstream client initialized");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
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
}
