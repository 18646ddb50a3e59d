//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and infrastructure.
//! Implementations live in other crates.

use crate::{ModelError, ParseError, ParsedDocument};
use async_trait::async_trait;
use std::sync::Arc;

/// Per-call options passed to a model capability
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    /// System-level instruction preceding the prompt
    pub system_preamble: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Ask the backend for JSON output when it supports a JSON mode
    pub json_mode: bool,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            system_preamble: None,
            temperature: 0.1,
            json_mode: true,
        }
    }
}

/// Abstract text-completion service
///
/// Implemented by the infrastructure layer (tasklift-llm). Calls must be
/// safely retryable: no caller-visible side effects.
#[async_trait]
pub trait ModelCapability: Send + Sync {
    /// Complete a prompt
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
        -> Result<String, ModelError>;

    /// Backend label for logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: ModelCapability + ?Sized> ModelCapability for Arc<T> {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, ModelError> {
        (**self).complete(prompt, options).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Converts raw document bytes into text and metadata
///
/// Implemented by the infrastructure layer (tasklift-parsers). Parsing is
/// synchronous; callers run it on a blocking thread.
pub trait DocumentParser: Send + Sync {
    /// Parse raw bytes
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError>;

    /// Whether this parser handles the given MIME type
    fn supports(&self, mime_type: &str) -> bool;
}
