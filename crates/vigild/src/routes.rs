//! API routes for vigild.
//!
//! The HTTP adapter owns envelope translation: path/query extraction,
//! optional base64 body decoding, and the error-taxonomy-to-status
//! mapping. The core pipeline never sees transport fields.

use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use vigil_common::store::AlertRow;
use vigil_common::PipelineError;

type AppStateArc = Arc<AppState>;

/// JSON error body shared by every failure response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

fn error_response(err: &PipelineError) -> (StatusCode, Json<ErrorBody>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

fn bad_request(message: &str) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

// ============================================================================
// Submission Routes
// ============================================================================

/// Query parameters for a dataset submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitParams {
    /// Body is base64-encoded when true.
    #[serde(default)]
    pub base64: bool,
}

/// Stress assessment section of a successful submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressAnalysisBody {
    pub stress_score: f64,
    pub analysis: String,
    pub threshold_exceeded: bool,
}

/// Successful submission response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub user_id: String,
    pub stress_analysis: StressAnalysisBody,
}

pub fn dataset_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/datasets/:name", post(submit_dataset))
}

async fn submit_dataset(
    State(state): State<AppStateArc>,
    Path(name): Path<String>,
    Query(params): Query<SubmitParams>,
    body: String,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ErrorBody>)> {
    info!(subject = %name, body_len = body.len(), "Dataset submission received");

    if name.trim().is_empty() {
        return Err(bad_request("Missing subject name in path"));
    }

    if body.is_empty() {
        return Err(bad_request("Missing CSV file in request body"));
    }

    let raw = if params.base64 {
        let decoded = BASE64
            .decode(body.as_bytes())
            .map_err(|_| bad_request("Body is not valid base64"))?;
        String::from_utf8(decoded).map_err(|_| bad_request("Decoded body is not valid UTF-8"))?
    } else {
        body
    };

    match state.pipeline.process(&name, &raw).await {
        Ok(outcome) => Ok(Json(SubmitResponse {
            user_id: outcome.subject_id.to_string(),
            stress_analysis: StressAnalysisBody {
                stress_score: outcome.stress_score,
                analysis: outcome.analysis,
                threshold_exceeded: outcome.threshold_exceeded,
            },
        })),
        Err(err) => {
            if err.is_caller_fault() {
                info!(subject = %name, "Submission rejected: {}", err);
            } else {
                error!(subject = %name, "Submission failed: {}", err);
            }
            Err(error_response(&err))
        }
    }
}

// ============================================================================
// Alerts Routes
// ============================================================================

pub fn alert_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/alerts", get(list_alerts))
}

async fn list_alerts(
    State(state): State<AppStateArc>,
) -> Result<Json<Vec<AlertRow>>, (StatusCode, Json<ErrorBody>)> {
    match state.store.list_alerts().await {
        Ok(alerts) => {
            info!(count = alerts.len(), "Listing alerted subjects");
            Ok(Json(alerts))
        }
        Err(e) => {
            error!("Alert listing failed: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
