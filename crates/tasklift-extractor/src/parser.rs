//! Coerce model JSON into candidates, tasks, summaries and minutes
//!
//! Models drift on key names and value types, so every field is read
//! leniently: alternate spellings are accepted, blank strings and the
//! literal `"null"` count as absent, and numbers may arrive as strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use tasklift_domain::{
    CandidateTask, MeetingMinutes, Priority, StakeholderSummary, Task, TaskStatus,
};
use tracing::debug;

const OWNER_KEYS: &[&str] = &["owner", "ownerRaw", "owner_raw", "assignee"];
const DUE_KEYS: &[&str] = &["dueDate", "due_date", "dueDateRaw", "due_date_raw", "deadline"];
const QUOTE_KEYS: &[&str] = &["sourceQuote", "source_quote", "quote"];

/// Title given to validated tasks the model left untitled
pub const UNTITLED_TASK: &str = "Untitled Task";

/// Read first-pass items as candidates; non-object items are skipped
pub fn parse_candidates(items: Vec<Value>) -> Vec<CandidateTask> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| CandidateTask {
            title: text(obj, &["title"]),
            description: text(obj, &["description"]),
            owner: text(obj, OWNER_KEYS),
            due_date: text(obj, DUE_KEYS),
            priority: text(obj, &["priority"]),
            status: text(obj, &["status"]),
            source_quote: text(obj, QUOTE_KEYS),
            confidence: number(obj, "confidence"),
            tags: strings(obj, &["tags"]),
        })
        .collect()
}

/// Read validated items as tasks
///
/// Items without a source quote are dropped. Identity fields stay empty
/// for the orchestrator to fill; the confidence is the model's proposal.
pub fn parse_tasks(items: Vec<Value>) -> Vec<Task> {
    let before = items.len();
    let tasks: Vec<Task> = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|obj| {
            let quote = text(obj, QUOTE_KEYS)?;
            let title = text(obj, &["title"]).unwrap_or_else(|| UNTITLED_TASK.to_string());

            let mut task = Task::new(title, quote);
            task.description = text(obj, &["description"]);
            task.owner_raw = text(obj, OWNER_KEYS);
            task.due_date_raw = text(obj, DUE_KEYS);
            task.due_date_iso = text(obj, &["dueDateISO", "dueDateIso", "due_date_iso"])
                .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
                .map(|dt| dt.with_timezone(&Utc));
            task.priority = text(obj, &["priority"]).and_then(|p| Priority::parse(&p));
            task.status = text(obj, &["status"])
                .and_then(|s| TaskStatus::parse(&s))
                .unwrap_or_default();
            task.confidence = number(obj, "confidence").unwrap_or(0.5).clamp(0.0, 1.0);
            task.tags = strings(obj, &["tags"]);
            Some(task)
        })
        .collect();

    if tasks.len() < before {
        debug!(before, after = tasks.len(), "Dropped validated items without a source quote");
    }
    tasks
}

/// Read a stakeholder summary; missing categories are empty
pub fn parse_summary(value: &Value) -> StakeholderSummary {
    let Some(obj) = value.as_object() else {
        return StakeholderSummary::default();
    };
    StakeholderSummary {
        decisions: strings(obj, &["decisions"]),
        risks: strings(obj, &["risks"]),
        asks: strings(obj, &["asks"]),
        key_points: strings(obj, &["keyPoints", "key_points"]),
    }
}

/// Read meeting minutes; missing fields are absent or empty
///
/// The date accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_minutes(value: &Value) -> MeetingMinutes {
    let Some(obj) = value.as_object() else {
        return MeetingMinutes::default();
    };
    MeetingMinutes {
        title: text(obj, &["title"]),
        date: text(obj, &["date"]).and_then(|raw| parse_minutes_date(&raw)),
        participants: strings(obj, &["participants", "attendees"]),
        agenda: strings(obj, &["agenda"]),
        notes: text(obj, &["notes"]),
        next_steps: strings(obj, &["nextSteps", "next_steps"]),
    }
}

fn parse_minutes_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// First present string under any of `keys`; numbers are stringified
fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && !s.eq_ignore_ascii_case("null")).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// String list under the first key holding an array; a lone string
/// becomes a one-element list
fn strings(obj: &Map<String, Value>, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match obj.get(*key) {
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect();
            }
            Some(Value::String(s)) if !s.trim().is_empty() => return vec![s.trim().to_string()],
            _ => {}
        }
    }
    Vec::new()
}
