//! Tasklift Extractor
//!
//! Turns meeting notes, documents and email threads into traceable action
//! items using a two-pass model protocol.
//!
//! # Architecture
//!
//! ```text
//! bytes/text → Parser → Normalizer → Chunker → Model × N chunks (candidates)
//!            → Model × 1 (validation) → Date Resolver + Confidence Scorer
//!            → Deduplicator → tasks
//! cleaned text (+ task titles) → Model → stakeholder summary
//! cleaned text → Model → meeting minutes
//! ```
//!
//! # Key Features
//!
//! - **Traceability**: every task carries the source quote it came from
//! - **Two passes**: a lenient extraction per chunk, then one strict validation
//! - **Forward date resolution**: "Friday" never lands in the past
//! - **Deterministic scoring**: confidence is recomputed after validation
//! - **Near-duplicate merging** across overlapping chunks
//!
//! # Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use tasklift_extractor::{Extractor, ExtractorConfig, RunRequest};
//! use tasklift_llm::MockModel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Arc::new(MockModel::default());
//! let extractor = Extractor::new(model, ExtractorConfig::default())?;
//!
//! let request = RunRequest::text(
//!     "Alex to confirm data source access by Feb 10.",
//!     Utc::now(),
//!     "America/New_York",
//! );
//! let output = extractor.run(request).await?;
//!
//! for task in &output.tasks {
//!     println!("{} ({:.1})", task.title, task.confidence);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod chunking;
mod config;
mod dates;
mod dedup;
mod error;
mod extractor;
mod normalize;
mod parser;
mod prompt;
mod types;


pub use chunking::TextChunker;
pub use config::{DedupPolicy, ExtractorConfig};
pub use dates::resolve_date;
pub use dedup::{
    are_duplicates, deduplicate, deduplicate_with, merge_tasks, normalize_title,
    OWNER_SIMILARITY_THRESHOLD, TITLE_SIMILARITY_THRESHOLD,
};
pub use error::ExtractorError;
pub use extractor::{Extractor, HIGH_CONFIDENCE};
pub use normalize::normalize;
pub use parser::{parse_candidates, parse_minutes, parse_summary, parse_tasks};
pub use prompt::PromptBuilder;
pub use types::{RunOutput, RunRequest, RunStats, TextChunk};
