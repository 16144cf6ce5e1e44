//! Decision & Persistence Orchestrator.
//!
//! Sequences one dataset submission end to end: register the subject,
//! validate the dataset, ask the generation service for an assessment,
//! validate the reply, apply the threshold, and append the alert record.
//! The flow is linear within one logical task; the generation call is
//! the only long suspend point and never runs with a database
//! transaction open.

use crate::analysis;
use crate::error::PipelineError;
use crate::llm::GenerationBackend;
use crate::prompt;
use crate::schema;
use crate::store::Store;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub subject_id: Uuid,
    pub stress_score: f64,
    pub analysis: String,
    pub threshold_exceeded: bool,
}

/// The validate -> analyze -> validate -> persist pipeline.
pub struct Pipeline {
    store: Store,
    backend: Arc<dyn GenerationBackend>,
    threshold: f64,
}

impl Pipeline {
    pub fn new(store: Store, backend: Arc<dyn GenerationBackend>, threshold: f64) -> Self {
        Self {
            store,
            backend,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Run the pipeline for one subject and raw dataset body.
    pub async fn process(
        &self,
        subject_name: &str,
        raw_body: &str,
    ) -> Result<ProcessOutcome, PipelineError> {
        info!(subject = %subject_name, body_len = raw_body.len(), "Processing dataset submission");

        // Register first: a duplicate name fails fast before any parsing
        // or model work. The subject row commits here and stays committed
        // even if a later stage fails.
        let subject_id = self.store.insert_subject(subject_name).await?;
        info!(subject_id = %subject_id, "Registered subject");

        let dataset = schema::parse_dataset(raw_body).map_err(|e| {
            warn!(subject = %subject_name, "Dataset rejected: {}", e);
            PipelineError::Validation(e)
        })?;
        debug!(records = dataset.len(), "Dataset validated");

        // The prompt embeds the raw text, not the parsed model.
        let built = prompt::build_prompt(raw_body);

        info!("Calling generation service for stress analysis");
        let reply = self.backend.generate(&built).await.map_err(|e| {
            error!("Generation call failed: {}", e);
            PipelineError::Upstream(e)
        })?;

        let result = analysis::validate_reply(&reply).map_err(|e| {
            // Contract violation by the upstream model, not the caller.
            error!("Model reply failed validation: {}", e);
            PipelineError::ResponseValidation(e)
        })?;

        let threshold_exceeded = result.stress_score >= self.threshold;
        info!(
            stress_score = result.stress_score,
            threshold = self.threshold,
            threshold_exceeded,
            "Threshold decision"
        );

        if threshold_exceeded {
            self.store
                .insert_alert(subject_id, true, result.stress_score, &result.reason)
                .await?;
            info!(subject_id = %subject_id, "Alert record persisted");
        }

        Ok(ProcessOutcome {
            subject_id,
            stress_score: result.stress_score,
            analysis: result.reason,
            threshold_exceeded,
        })
    }
}
