//! Per-run extraction context

use crate::{DocumentMetadata, InputType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the prompts and the date resolver need to know about a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionContext {
    /// Instant against which relative dates are resolved
    pub reference_time: DateTime<Utc>,

    /// IANA timezone name (e.g. "America/New_York")
    pub timezone: String,

    /// Kind of input
    pub input_type: InputType,

    /// File name or other source label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,

    /// Parser metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_metadata: Option<DocumentMetadata>,
}

impl ExtractionContext {
    /// Create a context without a source name or metadata
    pub fn new(
        reference_time: DateTime<Utc>,
        timezone: impl Into<String>,
        input_type: InputType,
    ) -> Self {
        Self {
            reference_time,
            timezone: timezone.into(),
            input_type,
            source_name: None,
            document_metadata: None,
        }
    }

    /// Attach a source label
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }
}
