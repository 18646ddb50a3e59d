//! Near-duplicate task merging

use crate::config::DedupPolicy;
use tasklift_domain::Task;

/// Minimum normalized title similarity for two tasks to match
pub const TITLE_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Minimum owner similarity when both tasks name an owner
pub const OWNER_SIMILARITY_THRESHOLD: f64 = 0.8;

const STOPWORDS: &[&str] = &["the", "a", "an"];

/// Normalize a title for comparison
///
/// Lowercases, turns punctuation into spaces, drops articles and
/// collapses whitespace.
pub fn normalize_title(title: &str) -> String {
    let spaced: String = title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    spaced
        .split_whitespace()
        .filter(|word| !STOPWORDS.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Edit-distance similarity in [0, 1]
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Whether two tasks describe the same action item
pub fn are_duplicates(a: &Task, b: &Task) -> bool {
    let titles = similarity(&normalize_title(&a.title), &normalize_title(&b.title));
    if titles < TITLE_SIMILARITY_THRESHOLD {
        return false;
    }

    if let (Some(oa), Some(ob)) = (present(&a.owner_raw), present(&b.owner_raw)) {
        if similarity(&oa.to_lowercase(), &ob.to_lowercase()) < OWNER_SIMILARITY_THRESHOLD {
            return false;
        }
    }

    match (a.due_date_iso, b.due_date_iso) {
        (Some(da), Some(db)) => da == db,
        _ => true,
    }
}

/// Merge near-duplicates, keeping the highest-confidence task of each group
///
/// Tasks are scanned left to right; each unmerged task absorbs every later
/// duplicate of it. Survivors keep the position of their group's first task.
pub fn deduplicate(tasks: Vec<Task>) -> Vec<Task> {
    deduplicate_with(tasks, DedupPolicy::RepresentativeWins)
}

/// Merge near-duplicates under the given policy
pub fn deduplicate_with(tasks: Vec<Task>, policy: DedupPolicy) -> Vec<Task> {
    let mut merged = vec![false; tasks.len()];
    let mut result = Vec::with_capacity(tasks.len());

    for i in 0..tasks.len() {
        if merged[i] {
            continue;
        }

        let mut best = tasks[i].clone();
        for j in (i + 1)..tasks.len() {
            if merged[j] || !are_duplicates(&tasks[i], &tasks[j]) {
                continue;
            }
            merged[j] = true;
            best = match policy {
                DedupPolicy::RepresentativeWins => {
                    if tasks[j].confidence > best.confidence {
                        tasks[j].clone()
                    } else {
                        best
                    }
                }
                DedupPolicy::FieldMerge => merge_tasks(&best, &tasks[j]),
            };
        }
        result.push(best);
    }

    result
}

/// Reconcile two tasks field by field
///
/// The higher-confidence task (the first on a tie) supplies every field it
/// has; the other fills the gaps. Tags are unioned and the longer source
/// quote is kept.
pub fn merge_tasks(a: &Task, b: &Task) -> Task {
    let (base, other) = if b.confidence > a.confidence { (b, a) } else { (a, b) };
    let mut merged = base.clone();

    merged.description = pick(&base.description, &other.description);
    merged.owner_raw = pick(&base.owner_raw, &other.owner_raw);
    merged.owner_normalized = pick(&base.owner_normalized, &other.owner_normalized);
    merged.due_date_raw = pick(&base.due_date_raw, &other.due_date_raw);
    merged.due_date_iso = base.due_date_iso.or(other.due_date_iso);
    merged.priority = base.priority.or(other.priority);
    merged.source_location = base
        .source_location
        .clone()
        .or_else(|| other.source_location.clone());

    for tag in &other.tags {
        if !merged.tags.contains(tag) {
            merged.tags.push(tag.clone());
        }
    }

    if other.source_quote.chars().count() > base.source_quote.chars().count() {
        merged.source_quote = other.source_quote.clone();
    }

    merged
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn pick(preferred: &Option<String>, fallback: &Option<String>) -> Option<String> {
    present(preferred)
        .or_else(|| present(fallback))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tasklift_domain::Priority;

    fn task(title: &str, owner: Option<&str>, confidence: f64) -> Task {
        let mut task = Task::new(title, format!("quote for {}", title));
        task.owner_raw = owner.map(str::to_string);
        task.confidence = confidence;
        task
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Finalize the Dashboard!"), "finalize dashboard");
        assert_eq!(normalize_title("  Send   an e-mail "), "send e mail");
    }

    #[test]
    fn test_articles_do_not_block_merge() {
        let tasks = vec![
            task("Finalize dashboard", Some("Alex"), 0.7),
            task("finalize the dashboard", Some("Alex"), 0.9),
        ];
        let result = deduplicate(tasks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "finalize the dashboard");
        assert_eq!(result[0].confidence, 0.9);
    }

    #[test]
    fn test_first_wins_on_equal_confidence() {
        let tasks = vec![
            task("Finalize dashboard", Some("Alex"), 0.8),
            task("finalize the dashboard", Some("Alex"), 0.8),
        ];
        let result = deduplicate(tasks);
        assert_eq!(result[0].title, "Finalize dashboard");
    }

    #[test]
    fn test_different_owners_not_merged() {
        let tasks = vec![
            task("Finalize dashboard", Some("Alex"), 0.7),
            task("Finalize dashboard", Some("Jordan"), 0.9),
        ];
        assert_eq!(deduplicate(tasks).len(), 2);
    }

    #[test]
    fn test_missing_owner_skips_owner_check() {
        let tasks = vec![
            task("Finalize dashboard", Some("Alex"), 0.7),
            task("Finalize dashboard", None, 0.9),
        ];
        assert_eq!(deduplicate(tasks).len(), 1);
    }

    #[test]
    fn test_due_dates_must_match_when_both_present() {
        let mut a = task("Finalize dashboard", None, 0.7);
        let mut b = task("Finalize dashboard", None, 0.9);
        a.due_date_iso = Some(Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap());
        b.due_date_iso = Some(Utc.with_ymd_and_hms(2024, 2, 11, 0, 0, 0).unwrap());
        assert!(!are_duplicates(&a, &b));

        b.due_date_iso = a.due_date_iso;
        assert!(are_duplicates(&a, &b));

        b.due_date_iso = None;
        assert!(are_duplicates(&a, &b));
    }

    #[test]
    fn test_order_preserved() {
        let tasks = vec![
            task("Send agenda", None, 0.5),
            task("Book venue", None, 0.5),
            task("Send the agenda", None, 0.9),
        ];
        let titles: Vec<String> = deduplicate(tasks).into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["Send the agenda", "Book venue"]);
    }

    #[test]
    fn test_merge_tasks_fills_gaps() {
        let mut high = task("Finalize dashboard", None, 0.9);
        high.tags = vec!["launch".to_string()];
        high.source_quote = "short".to_string();

        let mut low = task("finalize the dashboard", Some("Alex"), 0.6);
        low.priority = Some(Priority::P1);
        low.tags = vec!["launch".to_string(), "analytics".to_string()];
        low.source_quote = "Alex should finalize the dashboard this week".to_string();

        let merged = merge_tasks(&low, &high);
        assert_eq!(merged.title, "Finalize dashboard");
        assert_eq!(merged.confidence, 0.9);
        assert_eq!(merged.owner_raw.as_deref(), Some("Alex"));
        assert_eq!(merged.priority, Some(Priority::P1));
        assert_eq!(merged.tags, vec!["launch", "analytics"]);
        assert_eq!(merged.source_quote, low.source_quote);
    }

    #[test]
    fn test_field_merge_policy() {
        let mut a = task("Finalize dashboard", None, 0.9);
        a.due_date_raw = None;
        let mut b = task("finalize the dashboard", Some("Alex"), 0.5);
        b.due_date_raw = Some("Friday".to_string());

        let result = deduplicate_with(vec![a, b], DedupPolicy::FieldMerge);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].title, "Finalize dashboard");
        assert_eq!(result[0].owner_raw.as_deref(), Some("Alex"));
        assert_eq!(result[0].due_date_raw.as_deref(), Some("Friday"));
    }
}
