//! Structured stress assessment and model-reply validation.
//!
//! The generation service was asked to emit exactly this shape, but it
//! is an untrusted producer: its output gets the same validation
//! discipline as inbound user data.

use serde::{Deserialize, Serialize};

/// Longest accepted rationale, in characters.
pub const MAX_REASON_CHARS: usize = 5000;

/// Validated stress assessment produced by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0-100 inclusive.
    pub stress_score: f64,
    pub reason: String,
}

/// Model-reply validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error("reply is not a JSON object: {0}")]
    MalformedJson(String),

    #[error("reply schema violation: {0}")]
    Schema(String),

    #[error("reply out of range: {0}")]
    Range(String),
}

/// Parse and validate a raw model reply.
pub fn validate_reply(raw: &str) -> Result<AnalysisResult, ResponseError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ResponseError::MalformedJson(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| ResponseError::MalformedJson("top-level value is not an object".to_string()))?;

    let stress_score = object
        .get("stress_score")
        .ok_or_else(|| ResponseError::Schema("'stress_score' is missing".to_string()))?
        .as_f64()
        .ok_or_else(|| ResponseError::Schema("'stress_score' is not a number".to_string()))?;

    let reason = object
        .get("reason")
        .ok_or_else(|| ResponseError::Schema("'reason' is missing".to_string()))?
        .as_str()
        .ok_or_else(|| ResponseError::Schema("'reason' is not a string".to_string()))?
        .to_string();

    if !(0.0..=100.0).contains(&stress_score) {
        return Err(ResponseError::Range(format!(
            "stress_score must be between 0 and 100, got {}",
            stress_score
        )));
    }

    let reason_chars = reason.chars().count();
    if reason_chars > MAX_REASON_CHARS {
        return Err(ResponseError::Range(format!(
            "reason must be at most {} characters, got {}",
            MAX_REASON_CHARS, reason_chars
        )));
    }

    Ok(AnalysisResult { stress_score, reason })
}
