//! Vigil Daemon - stress-alerting ingestion service.
//!
//! Accepts sensor/behavioral datasets, asks the generation service for
//! a stress assessment, and records alerts for subjects whose score
//! crosses the configured threshold.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vigil_common::{Config, OllamaBackend, Store};
use vigild::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Config is read once at startup; the subscriber level comes from
    // it, so the loader runs before tracing is initialized.
    let config = Config::load();

    let filter =
        EnvFilter::try_new(&config.daemon.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("vigild v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        threshold = config.alert.stress_threshold,
        model = %config.generation.model,
        url = %config.generation.url,
        "Configuration loaded"
    );

    let store = Store::open(&config.daemon.db_path)
        .await
        .context("Failed to open database")?;

    let backend = Arc::new(OllamaBackend::new(
        config.generation.url.clone(),
        config.generation.model.clone(),
        config.generation.timeout_secs,
    ));

    let state = AppState::new(store, backend, config.alert.stress_threshold);

    server::run(state, &config.daemon.listen_addr).await
}
