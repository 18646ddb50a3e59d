//! Tasklift Model Layer
//!
//! Pluggable model capability implementations and the model-adapter boundary.
//!
//! # Architecture
//!
//! This crate provides implementations of the `ModelCapability` trait from
//! `tasklift-domain`. Backends are swapped by handing a different
//! implementation to the pipeline; nothing downstream branches on the kind
//! of backend.
//!
//! # Models
//!
//! - `MockModel`: Scripted double for testing
//! - `OllamaModel`: Local Ollama API integration
//! - `OpenAiModel`: OpenAI-compatible chat completions (OpenAI, Azure OpenAI)
//!
//! # Adapter boundary
//!
//! - `ModelClient`: retry with backoff, per-call timeout, degenerate-response
//!   detection and JSON parsing behind one call
//! - `response`: the single place that understands the accepted JSON shapes
//!
//! # Examples
//!
//! ```
//! use tasklift_llm::MockModel;
//! use tasklift_domain::{CompletionOptions, ModelCapability};
//!
//! # async fn example() {
//! let model = MockModel::new(r#"{"tasks": []}"#);
//! let out = model.complete("any prompt", &CompletionOptions::default()).await.unwrap();
//! assert_eq!(out, r#"{"tasks": []}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;
pub mod response;
pub mod retry;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tasklift_domain::{CompletionOptions, ModelCapability, ModelError};

pub use ollama::OllamaModel;
pub use openai::OpenAiModel;
pub use response::{detect_items, extract_json, is_degenerate, parse_json};
pub use retry::{CallStats, ModelClient, RetryPolicy};

#[derive(Debug, Default)]
struct MockState {
    scripted: VecDeque<Result<String, ModelError>>,
    rules: Vec<(String, String)>,
    prompts: Vec<String>,
    call_count: usize,
}

/// Scripted model for deterministic testing
///
/// Responses are chosen in this order:
/// 1. the next scripted response, if any are queued
/// 2. the first rule whose needle occurs in the prompt
/// 3. the default response
///
/// # Examples
///
/// ```
/// use tasklift_llm::MockModel;
///
/// let model = MockModel::new("[]");
/// model.respond_when("stakeholder summary", r#"{"decisions": []}"#);
/// model.push_response(r#"{"tasks": []}"#);
/// assert_eq!(model.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockModel {
    default_response: String,
    state: Arc<Mutex<MockState>>,
}

impl MockModel {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue a response for the next unconsumed call
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().scripted.push_back(Ok(response.into()));
    }

    /// Queue an error for the next unconsumed call
    pub fn push_error(&self, error: ModelError) {
        self.state().scripted.push_back(Err(error));
    }

    /// Answer every prompt containing `needle` with `response`
    pub fn respond_when(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.state().rules.push((needle.into(), response.into()));
    }

    /// Number of calls made
    pub fn call_count(&self) -> usize {
        self.state().call_count
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    /// Reset the call count and the prompt log
    pub fn reset_call_count(&self) {
        let mut state = self.state();
        state.call_count = 0;
        state.prompts.clear();
    }
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new(r#"{"tasks": []}"#)
    }
}

#[async_trait]
impl ModelCapability for MockModel {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, ModelError> {
        let mut state = self.state();
        state.call_count += 1;
        state.prompts.push(prompt.to_string());

        if let Some(next) = state.scripted.pop_front() {
            return next;
        }

        if let Some((_, response)) = state
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
        {
            return Ok(response.clone());
        }

        Ok(self.default_response.clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
