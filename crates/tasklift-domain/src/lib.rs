//! Tasklift Domain Layer
//!
//! This crate contains the data model and the trait boundaries of the
//! extraction system. It holds no infrastructure: model backends, document
//! parsers and the pipeline itself live in other crates and depend on this one.
//!
//! ## Key Concepts
//!
//! - **Task**: an action item with a mandatory source quote for traceability
//! - **Candidate task**: unvalidated model output, every field optional
//! - **Extraction context**: reference time and timezone for one run
//! - **Email thread**: chronological messages reconstructed from nested mail
//! - **Model capability**: abstract text-completion service
//!
//! ## Architecture
//!
//! - Pure data types and deterministic scoring only
//! - Trait definitions for every external interaction
//! - Structured pipeline events routed through an injectable sink

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confidence;
pub mod context;
pub mod document;
pub mod email;
pub mod error;
pub mod events;
pub mod summary;
pub mod task;
pub mod traits;

// Re-exports for convenience
pub use confidence::{contains_vague_verb, score, ConfidenceFeatures, VAGUE_VERBS};
pub use context::ExtractionContext;
pub use document::{DocumentMetadata, DocumentSection, InputType, ParsedDocument, ThreadMetadata};
pub use email::{AttachmentInfo, EmailMessage, EmailThread, Mailbox, ThreadingMetadata};
pub use error::{ModelError, ParseError};
pub use events::{EventSink, PipelineEvent, RecordingSink, Stage, TracingSink};
pub use summary::{MeetingMinutes, StakeholderSummary};
pub use task::{
    CandidateTask, IntegrationState, Priority, SourceLocation, SyncStatus, Task, TaskStatus,
};
pub use traits::{CompletionOptions, DocumentParser, ModelCapability};
