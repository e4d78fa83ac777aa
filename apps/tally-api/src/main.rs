//! # Tally API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiConfig::load (TALLY_* env)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new (pool + migrations)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  axum::serve(router) ──── ctrl-c / SIGTERM ───► graceful shutdown       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_api::{router, ApiConfig, AppState};
use tally_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (RUST_LOG overrides the default level)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Tally API server...");

    let config = ApiConfig::load()?;
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        max_connections = config.db_max_connections,
        timeout_secs = config.request_timeout_secs,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config()).await?;
    info!("Database ready");

    let app = router(AppState::new(db.clone()), config.request_timeout());

    let listener = TcpListener::bind(config.http_addr).await?;
    info!(addr = %config.http_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
