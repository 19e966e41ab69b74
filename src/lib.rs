// docscribe - historical document transcription and entity annotation service
//
// Core modules:
// - Token annotation codec, span projection and record reconciliation
// - SQLite persistence for projects, documents and annotations
// - Image uploads, zip export and transcription through a hosted model
// - HTTP JSON API

// Performance logging macros - exported for use by other modules
#[macro_use]
pub mod macros;

pub mod annotation;
pub mod api;
pub mod config;
pub mod database;
pub mod state;
pub mod storage;
pub mod transcription;

use anyhow::{Context, Result};

use config::AppConfig;
use state::AppState;

// ============== Main App Entry ==============

pub async fn run() -> Result<()> {
    // Initialize env_logger to output to stderr (reads RUST_LOG env var)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("docscribe starting...");

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr;
    let state = AppState::initialize(config)?;
    log::info!("Transcription provider: {}", state.transcription().provider_name());

    let app = api::build_router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    log::info!("docscribe listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    log::info!("docscribe stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolve once `signal` fires. A listener that fails to install never resolves.
async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received, draining connections");
}
