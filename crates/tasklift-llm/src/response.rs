//! Model response shape detection
//!
//! Models are asked for JSON but do not always comply. Everything that
//! understands the accepted shapes lives here:
//!
//! - a bare array of items
//! - an object wrapping the array under `tasks`, `data` or `result`
//! - a single bare object, promoted to a one-element list

use serde_json::Value;
use tasklift_domain::ModelError;

/// Keys under which a wrapped item array may appear, in lookup order
pub const WRAPPER_KEYS: &[&str] = &["tasks", "data", "result"];

/// Check whether a raw response carries no content
///
/// Empty text, whitespace, `{}` and `[]` are degenerate.
pub fn is_degenerate(raw: &str) -> bool {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact.is_empty() || compact == "{}" || compact == "[]"
}

/// Locate the JSON payload inside a raw response
///
/// Strips a surrounding markdown code fence and any prose before the first
/// `{`/`[` or after the matching last `}`/`]`.
pub fn extract_json(raw: &str) -> &str {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Skip the language tag on the opening fence line
        let body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        text = match body.rfind("```") {
            Some(end) => body[..end].trim(),
            None => body.trim(),
        };
    }

    if text.starts_with('{') || text.starts_with('[') {
        return text;
    }

    let start = match text.find(['{', '[']) {
        Some(idx) => idx,
        None => return text,
    };
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    match text.rfind(close) {
        Some(end) if end > start => &text[start..=end],
        _ => &text[start..],
    }
}

/// Parse a raw response into JSON
///
/// Degenerate responses and unparseable text are both errors so the retry
/// policy treats them as failed attempts.
pub fn parse_json(raw: &str) -> Result<Value, ModelError> {
    if is_degenerate(raw) {
        return Err(ModelError::Degenerate);
    }

    let payload = extract_json(raw);
    serde_json::from_str(payload).map_err(|e| {
        let preview: String = raw.chars().take(200).collect();
        ModelError::Malformed(format!("{} in response: {}", e, preview))
    })
}

/// Normalize a parsed response into a list of items
pub fn detect_items(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(*key) {
                        return items;
                    }
                }
            }
            vec![Value::Object(map)]
        }
        _ => Vec::new(),
    }
}
