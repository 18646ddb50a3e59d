//! EML parser
//!
//! Two modes:
//!
//! - **Thread** (default): reconstruct the whole thread from nested
//!   `message/rfc822` parts and hand the combined text downstream
//! - **Simple**: read only the outermost message and prefix its subject

use crate::email::{self, NO_SUBJECT};
use crate::mime;
use std::sync::Arc;
use tasklift_domain::document::word_count;
use tasklift_domain::{
    DocumentMetadata, DocumentParser, EventSink, ParseError, ParsedDocument, ThreadMetadata,
    TracingSink,
};

/// How an EML input is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmlMode {
    /// Reconstruct the full thread
    #[default]
    Thread,
    /// Outermost message only
    Simple,
}

/// Parser for RFC 822 messages
pub struct EmlParser {
    mode: EmlMode,
    max_depth: usize,
    sink: Arc<dyn EventSink>,
}

impl EmlParser {
    /// Thread-mode parser with the default depth ceiling
    pub fn new() -> Self {
        Self {
            mode: EmlMode::Thread,
            max_depth: email::DEFAULT_MAX_DEPTH,
            sink: Arc::new(TracingSink),
        }
    }

    /// Set the parsing mode
    pub fn with_mode(mut self, mode: EmlMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the nested message ceiling
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Report skipped nested messages to this sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    fn parse_thread(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let thread = email::reconstruct_thread(bytes, self.max_depth, self.sink.as_ref())?;

        let author = thread
            .messages
            .first()
            .map(|m| m.from.display_name().to_string());
        let metadata = DocumentMetadata {
            page_count: None,
            word_count: word_count(&thread.combined_text),
            created_date: thread.start_date,
            author,
            subject: Some(thread.subject.clone()),
            thread: Some(ThreadMetadata {
                message_count: thread.message_count,
                participants: thread
                    .participants
                    .iter()
                    .map(|p| p.display_name().to_string())
                    .collect(),
                threading_complete: thread.metadata.threading_complete,
                is_single_message: thread.metadata.is_single_message,
            }),
        };

        Ok(ParsedDocument {
            text: thread.combined_text,
            sections: None,
            metadata,
        })
    }

    fn parse_simple(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let message = email::parse_single_message(bytes)?;
        let has_subject = message.subject != NO_SUBJECT;

        let text = if has_subject {
            format!("Subject: {}\n\n{}", message.subject, message.body)
        } else {
            message.body.clone()
        };

        let author = match &message.from.name {
            Some(name) => format!("{} <{}>", name, message.from.address),
            None => message.from.address.clone(),
        };

        Ok(ParsedDocument {
            metadata: DocumentMetadata {
                page_count: None,
                word_count: word_count(&message.body),
                created_date: message.date,
                author: Some(author),
                subject: has_subject.then(|| message.subject.clone()),
                thread: None,
            },
            text,
            sections: None,
        })
    }
}

impl Default for EmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentParser for EmlParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        match self.mode {
            EmlMode::Thread => self.parse_thread(bytes),
            EmlMode::Simple => self.parse_simple(bytes),
        }
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime::EML.contains(&mime_type)
    }
}
