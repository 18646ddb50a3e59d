//! Structured pipeline events
//!
//! The orchestrator reports progress through an [`EventSink`] instead of
//! printing. [`TracingSink`] forwards to `tracing`; [`RecordingSink`] keeps
//! events in memory so tests can assert on them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Document parsing
    Parse,
    /// Text normalization
    Clean,
    /// Chunking
    Chunk,
    /// First, lenient model pass
    CandidateExtraction,
    /// Second, strict model pass
    Validation,
    /// Date resolution and confidence scoring
    PostProcess,
    /// Near-duplicate merging
    Deduplicate,
    /// Stakeholder summary
    Summarize,
    /// Meeting minutes
    MeetingMinutes,
}

impl Stage {
    /// Stage name as shown in errors and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Clean => "clean",
            Stage::Chunk => "chunk",
            Stage::CandidateExtraction => "candidate_extraction",
            Stage::Validation => "validation",
            Stage::PostProcess => "post_process",
            Stage::Deduplicate => "deduplicate",
            Stage::Summarize => "summarize",
            Stage::MeetingMinutes => "meeting_minutes",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something worth reporting during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    /// A stage began
    StageStarted {
        /// Run identifier
        run_id: String,
        /// Stage
        stage: Stage,
    },
    /// A stage finished
    StageCompleted {
        /// Run identifier
        run_id: String,
        /// Stage
        stage: Stage,
        /// Elapsed time in milliseconds
        elapsed_ms: u64,
    },
    /// Candidates were extracted from one chunk
    ChunkExtracted {
        /// Chunk index
        chunk: usize,
        /// Number of candidates
        candidates: usize,
    },
    /// Candidates without a source quote were dropped
    CandidatesFiltered {
        /// Stage doing the filtering
        stage: Stage,
        /// Count before filtering
        before: usize,
        /// Count after filtering
        after: usize,
    },
    /// No candidate survived pre-filtering, validation was not called
    ValidationSkipped {
        /// Run identifier
        run_id: String,
    },
    /// A model attempt failed and will be retried
    ModelRetry {
        /// Attempt that failed, 1-based
        attempt: u32,
        /// Delay before the next attempt
        delay_ms: u64,
        /// Failure message
        error: String,
    },
    /// A due-date phrase could not be resolved
    DateUnresolved {
        /// Phrase as written
        phrase: String,
    },
    /// Near-duplicate tasks were merged
    TasksMerged {
        /// Task count before merging
        before: usize,
        /// Task count after merging
        after: usize,
    },
    /// A nested email could not be parsed and was skipped
    NestedMessageSkipped {
        /// Nesting depth of the skipped message
        depth: usize,
        /// Failure message
        reason: String,
    },
}

/// Receiver for pipeline events
pub trait EventSink: Send + Sync {
    /// Record one event
    fn emit(&self, event: PipelineEvent);
}

/// Sink that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::StageStarted { run_id, stage } => {
                tracing::debug!(run_id = %run_id, stage = %stage, "Stage started");
            }
            PipelineEvent::StageCompleted {
                run_id,
                stage,
                elapsed_ms,
            } => {
                tracing::info!(run_id = %run_id, stage = %stage, elapsed_ms, "Stage completed");
            }
            PipelineEvent::ChunkExtracted { chunk, candidates } => {
                tracing::debug!(chunk, candidates, "Chunk extracted");
            }
            PipelineEvent::CandidatesFiltered {
                stage,
                before,
                after,
            } => {
                tracing::debug!(
                    stage = %stage,
                    before,
                    after,
                    "Filtered candidates without source quote"
                );
            }
            PipelineEvent::ValidationSkipped { run_id } => {
                tracing::info!(
                    run_id = %run_id,
                    "No candidates with source quotes, skipping validation"
                );
            }
            PipelineEvent::ModelRetry {
                attempt,
                delay_ms,
                error,
            } => {
                tracing::warn!(attempt, delay_ms, error = %error, "Model call failed, retrying");
            }
            PipelineEvent::DateUnresolved { phrase } => {
                tracing::warn!(phrase = %phrase, "Could not resolve due date");
            }
            PipelineEvent::TasksMerged { before, after } => {
                tracing::info!(before, after, "Merged duplicate tasks");
            }
            PipelineEvent::NestedMessageSkipped { depth, reason } => {
                tracing::warn!(depth, reason = %reason, "Skipping nested message");
            }
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded events matching a predicate
    pub fn count(&self, predicate: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
