//! Ollama Model Implementation
//!
//! Provides integration with Ollama's local generate API.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama API
//! - Configurable endpoint and model
//! - JSON output mode
//! - Helpful errors when the server is down or the model is missing
//!
//! Retries are not done here; `ModelClient` owns the retry policy.
//!
//! # Examples
//!
//! ```no_run
//! use tasklift_llm::OllamaModel;
//!
//! let model = OllamaModel::new("http://localhost:11434", "llama3.1");
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tasklift_domain::{CompletionOptions, ModelCapability, ModelError};
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default HTTP timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Ollama API backend for local inference
pub struct OllamaModel {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Response from the Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaModel {
    /// Create a new Ollama backend
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        }
    }

    /// Create a backend at `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    fn build_request(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> OllamaGenerateRequest<'_> {
        let prompt = match &options.system_preamble {
            Some(system) => format!("{}\n\n{}", system, prompt),
            None => prompt.to_string(),
        };

        OllamaGenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
            },
            format: options.json_mode.then_some("json"),
        }
    }
}

#[async_trait]
impl ModelCapability for OllamaModel {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ModelError> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = self.build_request(prompt, options);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    ModelError::Transport(format!(
                        "Cannot connect to Ollama at {}. Is `ollama serve` running?",
                        self.endpoint
                    ))
                } else if e.is_timeout() {
                    ModelError::Timeout(DEFAULT_TIMEOUT_SECS)
                } else {
                    ModelError::Transport(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ModelError::ModelNotAvailable(format!(
                "{} (pull it first: ollama pull {})",
                self.model, self.model
            )));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ModelError::Transport(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Malformed(format!("Failed to parse response: {}", e)))?;

        debug!(model = %self.model, eval_count = ?parsed.eval_count, "Ollama generate finished");
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
