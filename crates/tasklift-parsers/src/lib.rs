//! Tasklift Document Parsers
//!
//! Implementations of the `DocumentParser` trait from `tasklift-domain`,
//! one per input type, plus email thread reconstruction.
//!
//! # Parsers
//!
//! - `PlainTextParser`: UTF-8 text and markdown
//! - `PdfParser`: three extraction strategies with per-page sections
//! - `DocxParser`: paragraphs, heading sections and core properties
//! - `EmlParser`: single messages or full threads from nested mail
//!
//! # Examples
//!
//! ```
//! use tasklift_domain::{DocumentParser, InputType};
//! use tasklift_parsers::ParserRegistry;
//!
//! let registry = ParserRegistry::new();
//! let parser = registry.get(InputType::Text).unwrap();
//! let doc = parser.parse(b"Alex to send the deck by Friday").unwrap();
//! assert_eq!(doc.metadata.word_count, 7);
//! ```

#![warn(missing_docs)]

pub mod docx;
pub mod email;
pub mod eml;
pub mod pdf;
pub mod text;

#[cfg(test)]
mod fixtures;

pub use docx::DocxParser;
pub use eml::{EmlMode, EmlParser};
pub use pdf::PdfParser;
pub use text::PlainTextParser;

use std::collections::HashMap;
use std::sync::Arc;
use tasklift_domain::{DocumentParser, EventSink, InputType, TracingSink};

/// MIME types accepted by each parser
pub mod mime {
    /// PDF
    pub const PDF: &[&str] = &["application/pdf"];
    /// Word documents
    pub const DOCX: &[&str] = &[
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "application/msword",
    ];
    /// Email
    pub const EML: &[&str] = &["message/rfc822", "application/vnd.ms-outlook"];
    /// Plain text
    pub const TEXT: &[&str] = &["text/plain", "text/markdown"];
}

/// Parsers keyed by input type
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<InputType, Arc<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Registry with every built-in parser at default settings
    pub fn new() -> Self {
        Self::with_defaults(true, email::DEFAULT_MAX_DEPTH, Arc::new(TracingSink))
    }

    /// Registry with every built-in parser
    ///
    /// `parse_email_threads` selects thread or simple mode for EML input.
    pub fn with_defaults(
        parse_email_threads: bool,
        max_email_depth: usize,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let mode = if parse_email_threads {
            EmlMode::Thread
        } else {
            EmlMode::Simple
        };
        let eml = EmlParser::new()
            .with_mode(mode)
            .with_max_depth(max_email_depth)
            .with_sink(sink);

        let mut registry = Self {
            parsers: HashMap::new(),
        };
        registry.register(InputType::Text, Arc::new(PlainTextParser));
        registry.register(InputType::Pdf, Arc::new(PdfParser::new()));
        registry.register(InputType::Docx, Arc::new(DocxParser));
        registry.register(InputType::Eml, Arc::new(eml));
        registry
    }

    /// Register or replace the parser for an input type
    pub fn register(&mut self, input_type: InputType, parser: Arc<dyn DocumentParser>) {
        self.parsers.insert(input_type, parser);
    }

    /// Parser for an input type
    pub fn get(&self, input_type: InputType) -> Option<Arc<dyn DocumentParser>> {
        self.parsers.get(&input_type).cloned()
    }

    /// First parser accepting a MIME type
    pub fn for_mime(&self, mime_type: &str) -> Option<(InputType, Arc<dyn DocumentParser>)> {
        [InputType::Pdf, InputType::Docx, InputType::Eml, InputType::Text]
            .into_iter()
            .find_map(|kind| {
                self.parsers
                    .get(&kind)
                    .filter(|p| p.supports(mime_type))
                    .map(|p| (kind, Arc::clone(p)))
            })
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
