//! Vigil Common - The stress-alerting core pipeline.
//!
//! Everything between the HTTP adapter and the outside world lives here:
//! dataset schema validation, prompt construction, the generation
//! backend seam, model-reply validation, persistence, and the
//! orchestrator that sequences them.

pub mod analysis;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod prompt;
pub mod schema;
pub mod store;

pub use analysis::{validate_reply, AnalysisResult, ResponseError};
pub use config::Config;
pub use error::PipelineError;
pub use llm::{FakeBackend, GenerationBackend, LlmError, OllamaBackend};
pub use pipeline::{Pipeline, ProcessOutcome};
pub use prompt::build_prompt;
pub use schema::{parse_dataset, Dataset, DatasetError, MentalHealthStatus, SensorRecord};
pub use store::{AlertRow, Store, StoreError};
