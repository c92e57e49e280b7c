//! Lift simulation HTTP server.
//!
//! Wires the SQLite repository, the in-process event bus, and the dispatch
//! runtime behind the Axum transport, then serves until Ctrl-C/SIGTERM.

mod config;

use config::Config;
use liftsim_core::InMemoryEventBus;
use liftsim_runtime::LiftRuntime;
use liftsim_sqlite::SqliteRepository;
use liftsim_web::{build_router, AppState};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting lift simulation server");
    info!(
        db = %config.database.path,
        floor_trip_ms = config.simulation.floor_trip_ms,
        "Configuration loaded"
    );

    // Database
    if let Some(parent) = Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let repo = Arc::new(SqliteRepository::new(&config.database.path).await?);
    info!("Repository ready");

    // Event bus + dispatch runtime
    let bus = Arc::new(InMemoryEventBus::new());
    let runtime = Arc::new(LiftRuntime::new(repo, bus, config.runtime()));
    info!("Dispatch runtime wired");

    // Transport
    let state = AppState::new(
        Arc::clone(&runtime.dispatcher),
        Arc::clone(&runtime.system),
        Arc::clone(&runtime.broadcaster),
    );
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, shutting down runtime");
    let timeout = Duration::from_secs(config.server.shutdown_timeout);
    if tokio::time::timeout(timeout, runtime.shutdown()).await.is_err() {
        warn!("runtime shutdown timed out, exiting anyway");
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
