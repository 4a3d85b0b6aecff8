//! MOCO Timer - a persistent work timer that books tracked time to MOCO
//!
//! This is the main entry point: with no subcommand it runs the daemon,
//! otherwise it acts as a client of a running daemon.

use std::sync::Arc;
use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use moco_timer::{
    api::create_router,
    client,
    config::{Command, Config},
    services::WatchIndicator,
    state::{AppState, TimerEngine},
    storage::FileStore,
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("moco_timer={},tower_http=info", config.log_level()))
        .with_writer(std::io::stderr)
        .init();

    match config.command.clone() {
        None | Some(Command::Serve) => serve(config).await,
        Some(command) => client::run(command, &config).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting moco-timer daemon v{}", env!("CARGO_PKG_VERSION"));

    let state_file = config.state_file();
    info!("Configuration: host={}, port={}, state_file={}, badge_refresh={}s",
          config.host, config.port, state_file.display(), config.badge_refresh_secs);

    // Load the engine from durable storage
    let store = Arc::new(FileStore::open(&state_file).await?);
    let indicator = Arc::new(WatchIndicator::new());
    let engine = TimerEngine::load(
        store,
        indicator.clone(),
        Arc::new(SystemClock),
        config.badge_refresh_period(),
    )
    .await
    .with_context(|| format!("Failed to load timer state from {}", state_file.display()))?;

    let state = Arc::new(AppState::new(engine.clone(), indicator, config.port, config.host.clone()));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message - startTimer, stopTimer, getTimerState");
    info!("  GET  /badge   - Current status indicator");
    info!("  GET  /status  - Timer snapshot and server info");
    info!("  GET  /health  - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    engine.shutdown();
    info!("Server shutdown complete");
    Ok(())
}
