//! Error types shared across crate boundaries

use thiserror::Error;

/// Errors raised by a model capability or the model-adapter boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Transport(String),

    /// The call did not complete within its deadline
    #[error("Model call timed out after {0}s")]
    Timeout(u64),

    /// Model not available on the backend
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Response was not valid JSON of an accepted shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Response was empty, whitespace, "{}" or "[]"
    #[error("Empty or degenerate response")]
    Degenerate,

    /// Every attempt failed
    #[error("Model call failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<ModelError>,
    },
}

impl ModelError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ModelError::ModelNotAvailable(_) | ModelError::RetriesExhausted { .. }
        )
    }
}

/// Errors raised by document parsers
#[derive(Error, Debug)]
pub enum ParseError {
    /// No parser handles this input
    #[error("Unsupported input: {0}")]
    Unsupported(String),

    /// The document structure could not be read
    #[error("Malformed document: {0}")]
    Malformed(String),

    /// Every extraction strategy produced empty text
    #[error("No text could be extracted (tried {}): {details}", attempted.join(", "))]
    NoText {
        /// Strategy names in the order tried
        attempted: Vec<String>,
        /// Per-strategy failure details
        details: String,
    },

    /// Nested messages exceeded the configured ceiling
    #[error("Nested message depth exceeded limit of {limit}")]
    DepthExceeded {
        /// Configured ceiling
        limit: usize,
    },

    /// I/O error while reading an archive member
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_text_lists_strategies() {
        let err = ParseError::NoText {
            attempted: vec!["pages".to_string(), "document".to_string()],
            details: "pages: empty; document: empty".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("pages, document"));
        assert!(msg.contains("document: empty"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ModelError::Degenerate.is_retryable());
        assert!(ModelError::Timeout(60).is_retryable());
        assert!(!ModelError::ModelNotAvailable("llama3".into()).is_retryable());
    }
}
