//! Body and subject cleaning

use once_cell::sync::Lazy;
use regex::Regex;

/// Markers that introduce quoted reply history
static REPLY_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?mi)^[ \t]*On\s.*wrote:",
        r"(?mi)^[ \t]*From:[^\n]*\n?[ \t]*Sent:",
        r"(?mi)^[ \t]*-{3,}\s*Original Message\s*-{3,}",
        r"(?m)^[ \t]*_{20,}[ \t]*$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid reply marker"))
    .collect()
});

/// Markers that start a signature block, checked in order
pub const SIGNATURE_MARKERS: &[&str] = &[
    "Sent from my",
    "Get Outlook for",
    "Best regards",
    "Kind regards",
    "Regards",
    "Sincerely",
    "Thanks",
    "Cheers",
    "--",
];

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

static SUBJECT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(re|fwd|fw)\s*:\s*").expect("valid regex"));

/// Strip quoted history and signature from a message body
///
/// 1. truncate at the earliest reply marker
/// 2. truncate at a signature marker whose last occurrence anywhere in the
///    text lies past the midpoint of the remaining text
/// 3. drop lines beginning with `>`
/// 4. collapse three or more newlines to one blank line
pub fn clean_body(body: &str) -> String {
    let normalized = body.replace("\r\n", "\n");
    let mut cleaned = normalized.as_str();

    if let Some(cut) = REPLY_MARKERS
        .iter()
        .filter_map(|re| re.find(cleaned).map(|m| m.start()))
        .min()
    {
        cleaned = &cleaned[..cut];
    }

    for marker in SIGNATURE_MARKERS {
        if let Some(idx) = cleaned.rfind(marker) {
            if idx * 2 > cleaned.len() {
                cleaned = &cleaned[..idx];
            }
        }
    }

    let unquoted = cleaned
        .lines()
        .filter(|line| !line.trim_start().starts_with('>'))
        .collect::<Vec<_>>()
        .join("\n");

    BLANK_RUNS.replace_all(&unquoted, "\n\n").trim().to_string()
}

/// Remove one leading Re:/Fwd:/Fw: token
pub fn clean_subject(subject: &str) -> String {
    SUBJECT_PREFIX.replace(subject, "").trim().to_string()
}

/// Convert an HTML body to plain text
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), 100) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "HTML conversion failed, stripping tags");
            strip_tags(html)
        }
    }
}

fn strip_tags(html: &str) -> String {
    static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));
    TAGS.replace_all(html, "").trim().to_string()
}
