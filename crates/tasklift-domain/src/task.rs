//! Task and candidate task types
//!
//! A [`Task`] is the finalized unit of output. Every task that leaves the
//! pipeline carries a non-empty source quote. A [`CandidateTask`] is the
//! lenient first-pass shape and is discarded after validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Task priority levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Critical
    P0,
    /// High
    P1,
    /// Medium
    P2,
    /// Low
    P3,
}

impl Priority {
    /// Parse a priority label as a model or a human would write it
    ///
    /// Accepts `P0`..`P3` in any case plus the common words
    /// (`critical`, `urgent`, `high`, `medium`, `normal`, `low`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "p0" | "critical" | "urgent" => Some(Priority::P0),
            "p1" | "high" => Some(Priority::P1),
            "p2" | "medium" | "normal" => Some(Priority::P2),
            "p3" | "low" => Some(Priority::P3),
            _ => None,
        }
    }

    /// Label as used in prompts and exports
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Freshly extracted
    #[default]
    New,
    /// Work has started
    InProgress,
    /// Waiting on something else
    Blocked,
    /// Completed
    Done,
    /// Status could not be determined
    Unknown,
}

impl TaskStatus {
    /// Parse a status label; unknown labels yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "NEW" | "OPEN" | "TODO" => Some(TaskStatus::New),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "BLOCKED" => Some(TaskStatus::Blocked),
            "DONE" | "COMPLETE" | "COMPLETED" => Some(TaskStatus::Done),
            "UNKNOWN" => Some(TaskStatus::Unknown),
            _ => None,
        }
    }
}

/// Location of a task in its source document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    /// Page number (PDFs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// Section title (structured documents)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,

    /// Paragraph index (emails, plain text)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_index: Option<u32>,

    /// Line number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
}

/// Sync status of a task against one external tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    /// Pushed successfully
    Success,
    /// Push failed
    Failed,
    /// Deliberately not pushed
    Skipped,
}

/// Per-target integration state, filled in by external connectors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationState {
    /// Identifier in the external system
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Last sync outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_status: Option<SyncStatus>,

    /// When the last sync happened
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,

    /// Error from the last failed sync
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A finalized action item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier; left empty by the pipeline for the repository to assign
    pub id: String,

    /// Run that produced this task
    pub run_id: String,

    /// Short actionable summary
    pub title: String,

    /// Optional details
    pub description: Option<String>,

    /// Owner exactly as written in the source
    pub owner_raw: Option<String>,

    /// Owner resolved to an email or user id by the caller
    pub owner_normalized: Option<String>,

    /// Due date exactly as written in the source
    pub due_date_raw: Option<String>,

    /// Resolved due date
    #[serde(rename = "dueDateISO")]
    pub due_date_iso: Option<DateTime<Utc>>,

    /// Priority if stated
    pub priority: Option<Priority>,

    /// Lifecycle status
    pub status: TaskStatus,

    /// Extraction quality in [0, 1]
    pub confidence: f64,

    /// Verbatim excerpt the task was extracted from (never empty)
    pub source_quote: String,

    /// Where in the document the quote was found
    pub source_location: Option<SourceLocation>,

    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Per-target sync state
    #[serde(default)]
    pub integration_state: BTreeMap<String, IntegrationState>,
}

impl Task {
    /// Create a task with only the required fields set
    pub fn new(title: impl Into<String>, source_quote: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            run_id: String::new(),
            title: title.into(),
            description: None,
            owner_raw: None,
            owner_normalized: None,
            due_date_raw: None,
            due_date_iso: None,
            priority: None,
            status: TaskStatus::New,
            confidence: 0.5,
            source_quote: source_quote.into(),
            source_location: None,
            tags: Vec::new(),
            integration_state: BTreeMap::new(),
        }
    }

    /// Whether the task carries a usable source quote
    pub fn has_source_quote(&self) -> bool {
        !self.source_quote.trim().is_empty()
    }
}

/// Unvalidated first-pass extraction output
///
/// Serialized (camelCase) into the validation instruction, so the model sees
/// the same field names it was asked to produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTask {
    /// Proposed title
    pub title: Option<String>,

    /// Proposed details
    pub description: Option<String>,

    /// Owner as written
    pub owner: Option<String>,

    /// Due date as written
    pub due_date: Option<String>,

    /// Priority label as written
    pub priority: Option<String>,

    /// Status label as written
    pub status: Option<String>,

    /// Supporting excerpt
    pub source_quote: Option<String>,

    /// Model-proposed confidence (advisory)
    pub confidence: Option<f64>,

    /// Proposed tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl CandidateTask {
    /// Whether the candidate has a non-blank source quote
    pub fn has_source_quote(&self) -> bool {
        self.source_quote
            .as_deref()
            .map(|q| !q.trim().is_empty())
            .unwrap_or(false)
    }
}
