//! PDF text extraction
//!
//! Strategies are tried in order until one yields non-empty text:
//!
//! 1. `pdf-extract` page by page
//! 2. `pdf-extract` over the whole document, split on form feeds
//! 3. `lopdf` content-stream text
//!
//! Both libraries can panic on malformed input, so every strategy runs
//! under `catch_unwind`. Metadata (page count, author, subject, creation
//! date) is read separately through `lopdf` and is best effort.

use crate::mime;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use lopdf::{Dictionary, Document, Object};
use std::panic::{self, AssertUnwindSafe};
use tasklift_domain::document::word_count;
use tasklift_domain::{
    DocumentMetadata, DocumentParser, DocumentSection, ParseError, ParsedDocument,
};
use tracing::{debug, warn};

type Strategy = fn(&[u8]) -> Result<Vec<String>, String>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("pdf-extract (pages)", extract_by_pages),
    ("pdf-extract (document)", extract_whole_document),
    ("lopdf", extract_with_lopdf),
];

/// Parser for PDF documents
#[derive(Debug, Clone)]
pub struct PdfParser {
    max_pages: usize,
}

impl PdfParser {
    /// Parser with the default page limit (1000)
    pub fn new() -> Self {
        Self { max_pages: 1000 }
    }

    /// Ignore pages past this limit
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }
}

impl Default for PdfParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for PdfParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let mut attempted = Vec::new();
        let mut failures = Vec::new();

        for (name, strategy) in STRATEGIES {
            attempted.push(name.to_string());
            match run_guarded(*strategy, bytes) {
                Ok(mut pages) => {
                    pages.truncate(self.max_pages);
                    let (text, sections) = assemble_pages(&pages);
                    if text.is_empty() {
                        debug!(strategy = name, "PDF strategy produced no text");
                        failures.push(format!("{}: no text", name));
                        continue;
                    }

                    debug!(strategy = name, pages = pages.len(), "Extracted PDF text");
                    let info = read_info(bytes);
                    let metadata = DocumentMetadata {
                        page_count: info
                            .page_count
                            .or_else(|| u32::try_from(pages.len()).ok()),
                        word_count: word_count(&text),
                        created_date: info.created,
                        author: info.author,
                        subject: info.subject,
                        thread: None,
                    };
                    return Ok(ParsedDocument {
                        text,
                        sections: (!sections.is_empty()).then_some(sections),
                        metadata,
                    });
                }
                Err(e) => {
                    warn!(strategy = name, error = %e, "PDF strategy failed");
                    failures.push(format!("{}: {}", name, e));
                }
            }
        }

        Err(ParseError::NoText {
            attempted,
            details: format!(
                "{}. The PDF may be a scanned image without a text layer, or use an unsupported encoding",
                failures.join("; ")
            ),
        })
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime::PDF.contains(&mime_type)
    }
}

fn run_guarded(strategy: Strategy, bytes: &[u8]) -> Result<Vec<String>, String> {
    panic::catch_unwind(AssertUnwindSafe(|| strategy(bytes)))
        .unwrap_or_else(|_| Err("extractor panicked on malformed input".to_string()))
}

fn extract_by_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())
}

fn extract_whole_document(bytes: &[u8]) -> Result<Vec<String>, String> {
    let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| e.to_string())?;
    Ok(text.split('\u{c}').map(str::to_string).collect())
}

fn extract_with_lopdf(bytes: &[u8]) -> Result<Vec<String>, String> {
    let doc = Document::load_mem(bytes).map_err(|e| e.to_string())?;
    let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    if numbers.is_empty() {
        return Err("document has no pages".to_string());
    }
    Ok(numbers
        .iter()
        .map(|n| doc.extract_text(&[*n]).unwrap_or_default())
        .collect())
}

/// Join non-empty pages with blank lines, one section per kept page
///
/// Page numbers refer to the position in the input, so skipped blank pages
/// leave gaps.
fn assemble_pages(pages: &[String]) -> (String, Vec<DocumentSection>) {
    let mut text = String::new();
    let mut sections = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let content = page.trim();
        if content.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        let start_offset = text.len();
        text.push_str(content);
        let number = index as u32 + 1;
        sections.push(DocumentSection {
            title: format!("Page {}", number),
            content: content.to_string(),
            start_offset,
            end_offset: text.len(),
            level: None,
            page: Some(number),
        });
    }

    (text, sections)
}

#[derive(Debug, Default)]
struct PdfInfo {
    page_count: Option<u32>,
    author: Option<String>,
    subject: Option<String>,
    created: Option<DateTime<Utc>>,
}

fn read_info(bytes: &[u8]) -> PdfInfo {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(error = %e, "PDF metadata unavailable");
                return PdfInfo::default();
            }
        };
        let mut info = PdfInfo {
            page_count: u32::try_from(doc.get_pages().len()).ok(),
            ..PdfInfo::default()
        };
        if let Some(dict) = info_dictionary(&doc) {
            info.author = text_entry(dict, b"Author");
            info.subject = text_entry(dict, b"Subject");
            info.created = text_entry(dict, b"CreationDate").and_then(|d| parse_pdf_date(&d));
        }
        info
    }))
    .unwrap_or_default()
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(raw, _) => {
            let value = decode_pdf_string(raw);
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, else Latin-1
fn decode_pdf_string(raw: &[u8]) -> String {
    if let Some(body) = raw.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    raw.iter().map(|&b| b as char).collect()
}

/// Parse `D:YYYYMMDDHHmmSS` with an optional `Z`, `+HH'mm'` or `-HH'mm'` suffix
fn parse_pdf_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = value.strip_prefix("D:").unwrap_or(value);
    let digits: String = value.chars().take_while(char::is_ascii_digit).collect();
    if digits.len() < 4 {
        return None;
    }

    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(s) => s.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits.get(0..4)?.parse().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, field(4, 2, 1)?, field(6, 2, 1)?)?
        .and_hms_opt(field(8, 2, 0)?, field(10, 2, 0)?, field(12, 2, 0)?)?;

    let rest = &value[digits.len()..];
    let offset_secs = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let nums: String = rest[1..].chars().filter(char::is_ascii_digit).collect();
            let hours: i32 = nums.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = nums.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == '-' {
                -secs
            } else {
                secs
            }
        }
        _ => 0,
    };

    FixedOffset::east_opt(offset_secs)?
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream, StringFormat};

    fn sample_pdf(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Author" => Object::String(b"Alex Example".to_vec(), StringFormat::Literal),
            "Subject" => Object::String(b"Quarterly review".to_vec(), StringFormat::Literal),
            "CreationDate" => Object::String(b"D:20240115093000Z".to_vec(), StringFormat::Literal),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_parse_generated_pdf() {
        let bytes = sample_pdf("Alex to send the quarterly deck");
        let doc = PdfParser::new().parse(&bytes).unwrap();

        assert!(doc.text.contains("quarterly"));
        assert_eq!(doc.metadata.page_count, Some(1));
        assert_eq!(doc.metadata.author.as_deref(), Some("Alex Example"));
        assert_eq!(doc.metadata.subject.as_deref(), Some("Quarterly review"));
        assert_eq!(
            doc.metadata.created_date.map(|d| d.to_rfc3339()),
            Some("2024-01-15T09:30:00+00:00".to_string())
        );
        let sections = doc.sections.unwrap();
        assert_eq!(sections[0].title, "Page 1");
        assert_eq!(sections[0].page, Some(1));
    }

    #[test]
    fn test_garbage_reports_every_strategy() {
        let err = PdfParser::new().parse(b"definitely not a pdf").unwrap_err();
        match err {
            ParseError::NoText { attempted, details } => {
                assert_eq!(
                    attempted,
                    vec!["pdf-extract (pages)", "pdf-extract (document)", "lopdf"]
                );
                assert!(details.contains("lopdf:"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_assemble_pages_offsets() {
        let pages = vec![
            " First page \n".to_string(),
            "   ".to_string(),
            "Third page".to_string(),
        ];
        let (text, sections) = assemble_pages(&pages);

        assert_eq!(text, "First page\n\nThird page");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "Page 3");
        assert_eq!(
            &text[sections[1].start_offset..sections[1].end_offset],
            "Third page"
        );
        assert_eq!(sections[0].start_offset, 0);
        assert_eq!(sections[0].end_offset, 10);
    }

    #[test]
    fn test_decode_pdf_string() {
        assert_eq!(decode_pdf_string(b"Caf\xe9"), "Café");
        assert_eq!(
            decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x6C]),
            "Al"
        );
    }

    #[test]
    fn test_parse_pdf_date() {
        assert_eq!(
            parse_pdf_date("D:20240115093000+02'00'").map(|d| d.to_rfc3339()),
            Some("2024-01-15T07:30:00+00:00".to_string())
        );
        assert_eq!(
            parse_pdf_date("D:2024").map(|d| d.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert!(parse_pdf_date("yesterday").is_none());
    }

    #[test]
    fn test_supports() {
        assert!(PdfParser::new().supports("application/pdf"));
        assert!(!PdfParser::new().supports("text/plain"));
    }
}
