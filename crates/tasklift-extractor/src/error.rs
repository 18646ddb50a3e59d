//! Error types for the Extractor

use tasklift_domain::{ModelError, ParseError, Stage};
use thiserror::Error;

/// Fatal errors for one extraction run
///
/// Every variant raised during a run names the stage it came from.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Required text or bytes missing for the declared input type
    #[error("Input error during parse: {0}")]
    Input(String),

    /// No parsing strategy produced text
    #[error("Parse error during {stage}: {source}")]
    Parse {
        /// Originating stage
        stage: Stage,
        /// Parser failure
        source: ParseError,
    },

    /// Model call failed after the retry policy gave up
    #[error("Model error during {stage}: {source}")]
    Model {
        /// Originating stage
        stage: Stage,
        /// Final model failure
        source: ModelError,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cleaned text exceeds the configured maximum
    #[error("Text too long during clean: {0} bytes (max: {1})")]
    TextTooLong(usize, usize),

    /// A blocking task could not be joined
    #[error("Internal error during {stage}: {message}")]
    Internal {
        /// Originating stage
        stage: Stage,
        /// Failure message
        message: String,
    },
}

impl ExtractorError {
    /// Stage the error came from; configuration errors precede any stage
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ExtractorError::Input(_) => Some(Stage::Parse),
            ExtractorError::Parse { stage, .. }
            | ExtractorError::Model { stage, .. }
            | ExtractorError::Internal { stage, .. } => Some(*stage),
            ExtractorError::TextTooLong(..) => Some(Stage::Clean),
            ExtractorError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_stage() {
        let err = ExtractorError::Model {
            stage: Stage::Validation,
            source: ModelError::Degenerate,
        };
        assert_eq!(err.stage(), Some(Stage::Validation));
        assert_eq!(
            err.to_string(),
            "Model error during validation: Empty or degenerate response"
        );
    }

    #[test]
    fn test_input_and_config_stages() {
        assert_eq!(
            ExtractorError::Input("missing".to_string()).stage(),
            Some(Stage::Parse)
        );
        assert_eq!(ExtractorError::TextTooLong(10, 5).stage(), Some(Stage::Clean));
        assert_eq!(ExtractorError::Config("bad".to_string()).stage(), None);
    }
}
