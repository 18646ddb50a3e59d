//! DOCX text extraction
//!
//! A DOCX file is a zip archive. Body text comes from `word/document.xml`,
//! one line group per paragraph; paragraphs styled `Heading1`..`Heading6`
//! open sections. Author, subject and creation date come from
//! `docProps/core.xml` when present.

use crate::mime;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use tasklift_domain::document::word_count;
use tasklift_domain::{
    DocumentMetadata, DocumentParser, DocumentSection, ParseError, ParsedDocument,
};
use tracing::debug;

/// Parser for Word documents
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxParser;

impl DocumentParser for DocxParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ParseError::Malformed(format!("DOCX zip: {}", e)))?;

        let body = read_entry(&mut archive, "word/document.xml")?.ok_or_else(|| {
            ParseError::Malformed("DOCX missing word/document.xml".to_string())
        })?;
        let paragraphs = read_paragraphs(&body)?;
        let (text, sections) = layout(&paragraphs);

        let mut metadata = DocumentMetadata {
            word_count: word_count(&text),
            ..DocumentMetadata::default()
        };
        match read_entry(&mut archive, "docProps/core.xml") {
            Ok(Some(core)) => apply_core_properties(&core, &mut metadata),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Ignoring unreadable DOCX core properties"),
        }

        Ok(ParsedDocument {
            text,
            sections: (!sections.is_empty()).then_some(sections),
            metadata,
        })
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime::DOCX.contains(&mime_type)
    }
}

fn read_entry(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, ParseError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(ParseError::Malformed(format!("DOCX {}: {}", name, e))),
    };
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(Some(content))
}

#[derive(Debug, PartialEq)]
struct Paragraph {
    text: String,
    heading: Option<u8>,
}

fn read_paragraphs(xml: &str) -> Result<Vec<Paragraph>, ParseError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();

    let mut current: Option<Paragraph> = None;
    let mut in_text = false;
    let mut in_tab_stops = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ParseError::Malformed(format!("DOCX XML: {}", e)))?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"p" => current = Some(Paragraph { text: String::new(), heading: None }),
                b"t" => in_text = true,
                b"tabs" => in_tab_stops = true,
                _ => inline_element(e, &mut current, in_tab_stops),
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(Paragraph { text: String::new(), heading: None }),
                _ => inline_element(e, &mut current, in_tab_stops),
            },
            Event::End(ref e) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(current.take()),
                b"t" => in_text = false,
                b"tabs" => in_tab_stops = false,
                _ => {}
            },
            Event::Text(ref e) if in_text => {
                let text = e
                    .unescape()
                    .map_err(|err| ParseError::Malformed(format!("DOCX XML: {}", err)))?;
                if let Some(paragraph) = current.as_mut() {
                    paragraph.text.push_str(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Tabs, breaks and paragraph styles inside a paragraph
fn inline_element(e: &BytesStart<'_>, current: &mut Option<Paragraph>, in_tab_stops: bool) {
    let Some(paragraph) = current.as_mut() else {
        return;
    };
    match e.local_name().as_ref() {
        b"tab" if !in_tab_stops => paragraph.text.push('\t'),
        b"br" | b"cr" => paragraph.text.push('\n'),
        b"pStyle" => paragraph.heading = attribute(e, b"val").as_deref().and_then(heading_level),
        _ => {}
    }
}

fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// `Heading1` / `heading 2` style ids to a level
fn heading_level(style: &str) -> Option<u8> {
    let lower = style.to_ascii_lowercase().replace(' ', "");
    let level: u8 = lower.strip_prefix("heading")?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Join non-empty paragraphs with blank lines and cut sections at headings
fn layout(paragraphs: &[Paragraph]) -> (String, Vec<DocumentSection>) {
    let mut text = String::new();
    let mut headings: Vec<(usize, usize, u8, String)> = Vec::new();

    for paragraph in paragraphs {
        let line = paragraph.text.trim();
        if line.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        let start = text.len();
        text.push_str(line);
        if let Some(level) = paragraph.heading {
            headings.push((start, text.len(), level, line.to_string()));
        }
    }

    let sections = headings
        .iter()
        .enumerate()
        .map(|(i, (start, title_end, level, title))| {
            let next = headings.get(i + 1).map(|h| h.0).unwrap_or(text.len());
            let body = text[*title_end..next].trim();
            let end_offset = *title_end + text[*title_end..next].trim_end().len();
            DocumentSection {
                title: title.clone(),
                content: body.to_string(),
                start_offset: *start,
                end_offset,
                level: Some(*level),
                page: None,
            }
        })
        .collect();

    (text, sections)
}

fn apply_core_properties(xml: &str, metadata: &mut DocumentMetadata) {
    let fields = match simple_elements(xml) {
        Ok(fields) => fields,
        Err(e) => {
            debug!(error = %e, "Ignoring malformed DOCX core properties");
            return;
        }
    };

    metadata.author = fields.get("creator").cloned();
    metadata.subject = fields
        .get("subject")
        .or_else(|| fields.get("title"))
        .cloned();
    metadata.created_date = fields
        .get("created")
        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
        .map(|d| d.with_timezone(&Utc));
}

/// Non-empty text of leaf elements, keyed by local name
fn simple_elements(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut fields = HashMap::new();
    let mut open: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Text(e) => {
                if let Some(name) = &open {
                    let value = e.unescape()?;
                    let value = value.trim();
                    if !value.is_empty() {
                        fields.insert(name.clone(), value.to_string());
                    }
                }
            }
            Event::End(_) => open = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fields)
}
