//! Parsed document types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of input a run was given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InputType {
    /// Free text supplied directly
    Text,
    /// PDF document
    Pdf,
    /// Word document
    Docx,
    /// Single email or threaded email chain (RFC 822)
    Eml,
}

impl InputType {
    /// Guess the input type from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" | "md" | "markdown" | "text" => Some(InputType::Text),
            "pdf" => Some(InputType::Pdf),
            "docx" => Some(InputType::Docx),
            "eml" | "msg" => Some(InputType::Eml),
            _ => None,
        }
    }

    /// Label used in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "TEXT",
            InputType::Pdf => "PDF",
            InputType::Docx => "DOCX",
            InputType::Eml => "EML",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A titled region of a document (page, heading)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    /// Section title ("Page 3", heading text)
    pub title: String,
    /// Section body, possibly empty for heading markers
    pub content: String,
    /// Byte offset into the document text
    pub start_offset: usize,
    /// Byte offset one past the end
    pub end_offset: usize,
    /// Heading level, 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    /// Page number, 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

/// Thread summary attached to email documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMetadata {
    /// Number of messages reconstructed
    pub message_count: usize,
    /// Participant display names
    pub participants: Vec<String>,
    /// Whether every reply could be attached to its parent
    pub threading_complete: bool,
    /// Whether the input held a single message
    pub is_single_message: bool,
}

/// Metadata gathered while parsing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Page count (PDF)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    /// Whitespace-separated word count
    pub word_count: usize,
    /// Creation or send date
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<DateTime<Utc>>,
    /// Author or sender
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Subject or title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Email thread details (EML only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<ThreadMetadata>,
}

/// Output of a document parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    /// Extracted text
    pub text: String,
    /// Optional structure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<DocumentSection>>,
    /// Metadata
    pub metadata: DocumentMetadata,
}

impl ParsedDocument {
    /// Wrap plain text, computing the word count
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let metadata = DocumentMetadata {
            word_count: word_count(&text),
            ..DocumentMetadata::default()
        };
        Self {
            text,
            sections: None,
            metadata,
        }
    }
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
