//! Email message and thread types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder address for messages without a sender
pub const UNKNOWN_ADDRESS: &str = "unknown@unknown.com";

/// A named email address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    /// Display name, if given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Address as written
    pub address: String,
}

impl Mailbox {
    /// Create a mailbox
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.filter(|n| !n.trim().is_empty()),
            address: address.into(),
        }
    }

    /// Name if present, otherwise the address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.address)
    }

    /// Address key used for de-duplication
    pub fn key(&self) -> String {
        self.address.trim().to_lowercase()
    }
}

/// A non-message attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentInfo {
    /// File name
    pub filename: String,
    /// MIME type
    pub content_type: String,
    /// Size in bytes
    pub size: usize,
}

/// One message of a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    /// Message-ID without angle brackets
    pub message_id: String,
    /// Parent Message-ID
    pub in_reply_to: Option<String>,
    /// Ancestor Message-IDs
    pub references: Vec<String>,
    /// Subject as sent
    pub subject: String,
    /// Sender
    pub from: Mailbox,
    /// Recipients
    pub to: Vec<Mailbox>,
    /// Carbon-copy recipients
    pub cc: Vec<Mailbox>,
    /// Declared send date
    pub date: Option<DateTime<Utc>>,
    /// Body without quoted history and signature
    pub body: String,
    /// Body as received
    pub raw_body: String,
    /// Whether the message was nested inside another one
    pub is_attachment: bool,
    /// Nesting depth (0 = outermost)
    pub depth: usize,
    /// Non-message attachments
    pub attachments: Vec<AttachmentInfo>,
}

/// Threading diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadingMetadata {
    /// True when no message is orphaned
    pub threading_complete: bool,
    /// In-Reply-To ids that match no message in the set
    pub orphaned_messages: Vec<String>,
    /// Whether only one message was found
    pub is_single_message: bool,
}

/// A reconstructed email thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailThread {
    /// Message-ID of the root message
    pub root_message_id: String,
    /// Root subject without a leading Re:/Fwd:/Fw:
    pub subject: String,
    /// Messages in chronological order
    pub messages: Vec<EmailMessage>,
    /// Distinct participants in first-seen order
    pub participants: Vec<Mailbox>,
    /// Date of the earliest dated message
    pub start_date: Option<DateTime<Utc>>,
    /// Date of the latest dated message
    pub last_date: Option<DateTime<Utc>>,
    /// Number of messages
    pub message_count: usize,
    /// Rendered document handed to the rest of the pipeline
    pub combined_text: String,
    /// Threading diagnostics
    pub metadata: ThreadingMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_display_name() {
        let named = Mailbox::new(Some("Alex".to_string()), "alex@example.com");
        let bare = Mailbox::new(Some(" ".to_string()), "bo@example.com");
        assert_eq!(named.display_name(), "Alex");
        assert_eq!(bare.display_name(), "bo@example.com");
        assert!(bare.name.is_none());
    }

    #[test]
    fn test_mailbox_key_is_case_insensitive() {
        let a = Mailbox::new(None, "Alex@Example.com");
        let b = Mailbox::new(None, "alex@example.com ");
        assert_eq!(a.key(), b.key());
    }
}
