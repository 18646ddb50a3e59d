//! Text normalization before chunking

use once_cell::sync::Lazy;
use regex::Regex;

static WRAPPED_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})-\n(\p{L})").expect("valid regex"));
static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("valid regex"));
static TRAILING_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m) +$").expect("valid regex"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));
static ELLIPSIS_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").expect("valid regex"));
static BANG_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").expect("valid regex"));
static QUESTION_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").expect("valid regex"));

/// Normalize whitespace and punctuation
///
/// - CRLF and lone CR become LF
/// - a letter, `-` at the line end and a letter on the next line join
///   into one word
/// - tabs become spaces, space runs collapse, trailing spaces go
/// - two or more blank lines become exactly one
/// - `....` becomes `...`, `!!` becomes `!`, `??` becomes `?`
///
/// The result is a fixed point: normalizing it again changes nothing.
pub fn normalize(text: &str) -> String {
    let mut current = normalize_pass(text);
    // After the first pass no CR or tab remains, so every further change
    // shortens the text
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = text.replace('\t', " ");
    let text = WRAPPED_WORD.replace_all(&text, "$1$2");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = TRAILING_SPACES.replace_all(&text, "");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = ELLIPSIS_RUNS.replace_all(&text, "...");
    let text = BANG_RUNS.replace_all(&text, "!");
    let text = QUESTION_RUNS.replace_all(&text, "?");
    text.trim().to_string()
}
