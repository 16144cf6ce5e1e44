//! HTTP server for vigild.

use crate::routes;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;
use vigil_common::llm::GenerationBackend;
use vigil_common::{Pipeline, Store};

/// Application state shared across handlers.
pub struct AppState {
    pub pipeline: Pipeline,
    pub store: Store,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, backend: Arc<dyn GenerationBackend>, threshold: f64) -> Self {
        Self {
            pipeline: Pipeline::new(store.clone(), backend, threshold),
            store,
            start_time: Instant::now(),
        }
    }
}

/// Assemble the router; split out so tests can drive it directly.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::dataset_routes())
        .merge(routes::alert_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until the process is stopped.
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app(Arc::new(state))).await?;
    Ok(())
}
