//! Generation backend - the seam around the external language model.
//!
//! Production code uses `OllamaBackend`, which posts to an Ollama
//! `/api/generate` endpoint. Test code uses `FakeBackend` with
//! pre-configured replies, so orchestration tests run without network.
//! Scope ends at collecting the complete text reply: no retries, no
//! streaming.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Default Ollama generate endpoint.
pub const DEFAULT_GENERATE_URL: &str = "http://127.0.0.1:11434/api/generate";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama3";

/// Generation backend errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("generation request failed: {0}")]
    Http(String),

    #[error("generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// The injected generation capability: `generate(prompt) -> text`.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

// ============================================================================
// Ollama Backend (Production)
// ============================================================================

/// HTTP backend for a local or remote Ollama instance.
pub struct OllamaBackend {
    url: String,
    model: String,
    timeout: Duration,
}

impl OllamaBackend {
    pub fn new(url: impl Into<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            url: url.into(),
            model: model.into(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationBackend for OllamaBackend {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;

        // `format: "json"` asks Ollama to constrain output to JSON; the
        // response validator remains the enforcement point.
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "format": "json"
        });

        debug!(url = %self.url, model = %self.model, prompt_len = prompt.len(), "Sending generation request");

        let response = client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let text = json
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        debug!(reply_len = text.len(), "Generation reply received");
        Ok(text)
    }
}

// ============================================================================
// Fake Backend (Testing)
// ============================================================================

/// Pre-configured generation backend for deterministic tests.
pub struct FakeBackend {
    reply: Result<String, String>,
}

impl FakeBackend {
    /// Always answer with the given text.
    pub fn with_reply(text: impl Into<String>) -> Self {
        Self {
            reply: Ok(text.into()),
        }
    }

    /// Always fail with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
        }
    }
}

#[async_trait]
impl GenerationBackend for FakeBackend {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(LlmError::Http(message.clone())),
        }
    }
}
