//! Auxiliary summaries produced alongside the task list

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// High-level insights for stakeholders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StakeholderSummary {
    /// Decisions that were made
    pub decisions: Vec<String>,
    /// Risks, blockers and concerns
    pub risks: Vec<String>,
    /// Questions or requests for input
    pub asks: Vec<String>,
    /// Other important points
    pub key_points: Vec<String>,
}

impl StakeholderSummary {
    /// True when every category is empty
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
            && self.risks.is_empty()
            && self.asks.is_empty()
            && self.key_points.is_empty()
    }
}

/// Structured meeting information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingMinutes {
    /// Meeting title or subject
    pub title: Option<String>,
    /// Meeting date
    pub date: Option<DateTime<Utc>>,
    /// Attendees
    pub participants: Vec<String>,
    /// Agenda items or topics
    pub agenda: Vec<String>,
    /// Discussion notes
    pub notes: Option<String>,
    /// Follow-up actions
    pub next_steps: Vec<String>,
}
