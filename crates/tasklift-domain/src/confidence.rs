//! Confidence scoring for extracted tasks
//!
//! Implements the deterministic rubric used after date resolution. The score
//! a model proposes during validation is advisory; this one is authoritative.
//!
//! Arithmetic runs in integer tenths so that results such as `0.5 - 0.4`
//! come out as exactly `0.1`.

use crate::Task;

/// Vocabulary that marks a title as vague
pub const VAGUE_VERBS: &[&str] = &[
    "look into",
    "consider",
    "think about",
    "explore",
    "investigate",
    "maybe",
    "perhaps",
    "possibly",
];

/// Base score before any feature is applied (tenths)
const BASE: i32 = 5;

/// Bonus for a named owner (tenths)
const OWNER_BONUS: i32 = 3;

/// Bonus for a stated due date (tenths)
const DUE_DATE_BONUS: i32 = 3;

/// Penalty for a vague title (tenths)
const VAGUE_PENALTY: i32 = 4;

/// Bonus for a specific action title (tenths)
const SPECIFIC_BONUS: i32 = 2;

/// Bonus for a detailed quote (tenths)
const DETAILED_QUOTE_BONUS: i32 = 2;

/// Quote length (in characters) above which a quote counts as detailed
pub const DETAILED_QUOTE_CHARS: usize = 50;

/// Inputs to the confidence rubric
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceFeatures<'a> {
    /// Task title
    pub title: &'a str,
    /// Owner as written, if any
    pub owner_raw: Option<&'a str>,
    /// Due date as written, if any
    pub due_date_raw: Option<&'a str>,
    /// Supporting quote
    pub source_quote: &'a str,
}

impl<'a> From<&'a Task> for ConfidenceFeatures<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            title: &task.title,
            owner_raw: task.owner_raw.as_deref(),
            due_date_raw: task.due_date_raw.as_deref(),
            source_quote: &task.source_quote,
        }
    }
}

/// Check whether text contains any vague verb (case-insensitive)
pub fn contains_vague_verb(text: &str) -> bool {
    let lower = text.to_lowercase();
    VAGUE_VERBS.iter().any(|verb| lower.contains(verb))
}

/// Score a task's extraction quality in [0, 1]
///
/// - base 0.5
/// - +0.3 with a non-empty owner
/// - +0.3 with a non-empty due date
/// - -0.4 for a vague title, +0.2 otherwise
/// - +0.2 when the quote is longer than 50 characters
pub fn score(features: ConfidenceFeatures<'_>) -> f64 {
    let mut tenths = BASE;

    if is_present(features.owner_raw) {
        tenths += OWNER_BONUS;
    }

    if is_present(features.due_date_raw) {
        tenths += DUE_DATE_BONUS;
    }

    if contains_vague_verb(features.title) {
        tenths -= VAGUE_PENALTY;
    } else {
        tenths += SPECIFIC_BONUS;
    }

    if features.source_quote.chars().count() > DETAILED_QUOTE_CHARS {
        tenths += DETAILED_QUOTE_BONUS;
    }

    f64::from(tenths.clamp(0, 10)) / 10.0
}

fn is_present(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vague_title_short_quote() {
        let s = score(ConfidenceFeatures {
            title: "Look into budget",
            owner_raw: None,
            due_date_raw: None,
            source_quote: "x",
        });
        assert_eq!(s, 0.1);
    }

    #[test]
    fn test_full_features_clamp_to_one() {
        let quote = "Alex will finalize the budget report and circulate it to finance by Feb 10.";
        assert!(quote.len() > 50);
        let s = score(ConfidenceFeatures {
            title: "Finalize budget report",
            owner_raw: Some("Alex"),
            due_date_raw: Some("Feb 10"),
            source_quote: quote,
        });
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_specific_title_only() {
        let s = score(ConfidenceFeatures {
            title: "Send the agenda",
            owner_raw: None,
            due_date_raw: None,
            source_quote: "Send the agenda.",
        });
        assert_eq!(s, 0.7);
    }

    #[test]
    fn test_blank_owner_counts_as_absent() {
        let s = score(ConfidenceFeatures {
            title: "Send the agenda",
            owner_raw: Some("  "),
            due_date_raw: Some(""),
            source_quote: "Send the agenda.",
        });
        assert_eq!(s, 0.7);
    }

    #[test]
    fn test_vague_verb_is_case_insensitive() {
        assert!(contains_vague_verb("Maybe update the wiki"));
        assert!(contains_vague_verb("INVESTIGATE the outage"));
        assert!(!contains_vague_verb("Update the wiki"));
    }

    #[test]
    fn test_score_from_task() {
        let mut task = Task::new("Consider a rewrite", "We could consider a rewrite.");
        task.owner_raw = Some("Dana".to_string());
        assert_eq!(score(ConfidenceFeatures::from(&task)), 0.4);
    }
}
