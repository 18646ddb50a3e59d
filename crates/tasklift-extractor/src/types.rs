//! Request and response types for extraction runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklift_domain::{DocumentMetadata, InputType, MeetingMinutes, StakeholderSummary, Task};

/// Input for one extraction run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Declared input kind
    pub input_type: InputType,

    /// Free text (TEXT input)
    pub text: Option<String>,

    /// Raw file contents (PDF, DOCX, EML)
    pub bytes: Option<Vec<u8>>,

    /// Instant relative dates are resolved against
    pub reference_time: DateTime<Utc>,

    /// IANA timezone name, e.g. `America/New_York`
    pub timezone: String,

    /// Label for the source (file name, subject)
    pub source_name: Option<String>,

    /// Caller-assigned run id; a UUIDv7 is generated when absent
    pub run_id: Option<String>,
}

impl RunRequest {
    /// Request over free text
    pub fn text(
        text: impl Into<String>,
        reference_time: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            input_type: InputType::Text,
            text: Some(text.into()),
            bytes: None,
            reference_time,
            timezone: timezone.into(),
            source_name: None,
            run_id: None,
        }
    }

    /// Request over a document's raw bytes
    pub fn document(
        input_type: InputType,
        bytes: Vec<u8>,
        reference_time: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            input_type,
            text: None,
            bytes: Some(bytes),
            reference_time,
            timezone: timezone.into(),
            source_name: None,
            run_id: None,
        }
    }

    /// Attach a source label
    pub fn with_source_name(mut self, source_name: impl Into<String>) -> Self {
        self.source_name = Some(source_name.into());
        self
    }

    /// Use a caller-assigned run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    /// Total run time
    pub wall_clock_ms: u64,

    /// Logical model calls
    pub model_call_count: u64,

    /// Model attempts, retries included
    pub model_attempt_count: u64,

    /// Chunks produced
    pub chunk_count: usize,

    /// Candidates returned by the first pass
    pub candidate_count: usize,

    /// Tasks surviving validation
    pub validated_count: usize,

    /// Tasks after deduplication
    pub final_task_count: usize,

    /// Tasks removed by deduplication
    pub merged_count: usize,

    /// Final tasks with confidence of at least 0.8
    pub high_confidence_count: usize,
}

/// Result of one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    /// Run identifier carried by every task
    pub run_id: String,

    /// Final, deduplicated tasks in document order
    pub tasks: Vec<Task>,

    /// Stakeholder summary
    pub summary: StakeholderSummary,

    /// Meeting minutes, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_minutes: Option<MeetingMinutes>,

    /// Metadata reported by the parser
    pub document_metadata: DocumentMetadata,

    /// Run statistics
    pub stats: RunStats,
}

/// A slice of the cleaned text sent to the model on its own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position in the chunk sequence
    pub index: usize,

    /// Chunk text, trimmed
    pub text: String,

    /// Byte offset of the window start
    pub start_offset: usize,

    /// Byte offset one past the window end
    pub end_offset: usize,
}
