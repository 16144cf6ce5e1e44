//! Pipeline error taxonomy.
//!
//! Every run is strictly success or one categorized failure; there are
//! no partial or successful-with-warnings outcomes. Conflict and
//! Validation are caller-caused; Upstream and ResponseValidation are
//! server-caused and operator-actionable. Nothing is retried.

use crate::analysis::ResponseError;
use crate::llm::LlmError;
use crate::schema::DatasetError;
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Duplicate subject name (409).
    #[error("a subject named '{0}' already exists; use a different subject id")]
    Conflict(String),

    /// Malformed or out-of-range inbound dataset (400).
    #[error("invalid dataset: {0}")]
    Validation(#[from] DatasetError),

    /// Generation service unreachable or errored (500).
    #[error("generation service failure: {0}")]
    Upstream(#[from] LlmError),

    /// Model reply broke the response contract (500). Requires operator
    /// attention, not caller remediation.
    #[error("invalid response format from the model: {0}; operators have been notified")]
    ResponseValidation(#[from] ResponseError),

    /// Anything unclassified (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// HTTP-equivalent status for this failure class.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Conflict(_) => 409,
            Self::Validation(_) => 400,
            Self::Upstream(_) | Self::ResponseValidation(_) | Self::Internal(_) => 500,
        }
    }

    /// True when the caller, not the service, must fix the request.
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Validation(_))
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(name) => Self::Conflict(name),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(PipelineError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            PipelineError::Validation(DatasetError::Empty).status_code(),
            400
        );
        assert_eq!(
            PipelineError::Upstream(LlmError::Http("down".into())).status_code(),
            500
        );
        assert_eq!(PipelineError::Internal("?".into()).status_code(), 500);
    }

    #[test]
    fn test_fault_attribution() {
        assert!(PipelineError::Conflict("x".into()).is_caller_fault());
        assert!(PipelineError::Validation(DatasetError::Empty).is_caller_fault());
        assert!(!PipelineError::Upstream(LlmError::Http("down".into())).is_caller_fault());
        assert!(!PipelineError::ResponseValidation(
            crate::analysis::ResponseError::MalformedJson("not json".into())
        )
        .is_caller_fault());
    }

    #[test]
    fn test_store_conflict_maps_to_conflict() {
        let err: PipelineError = StoreError::Conflict("student-1".into()).into();
        assert!(matches!(err, PipelineError::Conflict(_)));
        assert_eq!(err.status_code(), 409);
    }
}
