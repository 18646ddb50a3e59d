//! Email thread reconstruction
//!
//! Turns one raw message, possibly carrying earlier messages as
//! `message/rfc822` attachments, into a chronological [`EmailThread`]:
//!
//! ```text
//! bytes → root + nested messages (depth-first) → cleaned bodies
//!       → chronological sort → root, subject, participants, orphans
//!       → combined text
//! ```
//!
//! Nested messages that cannot be parsed are skipped with a warning.
//! Nesting deeper than the configured ceiling fails the whole parse.

mod clean;
mod message;
mod thread;

pub use clean::{clean_body, clean_subject, html_to_text, SIGNATURE_MARKERS};
pub use message::NO_SUBJECT;
pub use thread::build_thread;

use message::MessageCollector;
use tasklift_domain::{EmailMessage, EmailThread, EventSink, ParseError, TracingSink};

/// Default ceiling for nested message depth
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Reconstruct a thread from raw message bytes
pub fn reconstruct_thread(
    bytes: &[u8],
    max_depth: usize,
    sink: &dyn EventSink,
) -> Result<EmailThread, ParseError> {
    let messages = MessageCollector::new(max_depth, sink).collect_root(bytes)?;
    tracing::debug!(messages = messages.len(), "Collected email messages");
    build_thread(messages)
}

/// Parse only the outermost message
pub fn parse_single_message(bytes: &[u8]) -> Result<EmailMessage, ParseError> {
    MessageCollector::new(0, &TracingSink).convert_root(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasklift_domain::email::UNKNOWN_ADDRESS;
    use crate::fixtures::{EMPTY_NESTED_MESSAGE, NESTED_THREAD};
    use tasklift_domain::{PipelineEvent, RecordingSink};

    #[test]
    fn test_reconstruct_nested_thread() {
        let sink = RecordingSink::new();
        let thread =
            reconstruct_thread(NESTED_THREAD.as_bytes(), DEFAULT_MAX_DEPTH, &sink).unwrap();

        assert_eq!(thread.message_count, 3);
        let ids: Vec<&str> = thread.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m1@example.com", "m2@example.com", "m3@example.com"]);
        let depths: Vec<usize> = thread.messages.iter().map(|m| m.depth).collect();
        assert_eq!(depths, vec![2, 1, 0]);

        assert_eq!(thread.root_message_id, "m1@example.com");
        assert_eq!(thread.subject, "Launch plan");
        assert!(!thread.metadata.threading_complete);
        assert_eq!(thread.metadata.orphaned_messages, vec!["missing@example.com"]);

        // alex@ and ALEX@ collapse to one participant
        let keys: Vec<String> = thread.participants.iter().map(|p| p.key()).collect();
        assert_eq!(keys, vec!["carol@example.com", "bo@example.com", "alex@example.com"]);

        assert!(thread
            .combined_text
            .starts_with("--- Message from Carol on 2024-01-01T10:00:00.000Z ---"));
        assert!(thread.combined_text.contains("Alex will confirm data source access by Feb 10."));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_depth_ceiling() {
        let sink = RecordingSink::new();
        let err = reconstruct_thread(NESTED_THREAD.as_bytes(), 1, &sink).unwrap_err();
        assert!(matches!(err, ParseError::DepthExceeded { limit: 1 }));
    }

    #[test]
    fn test_empty_nested_message_skipped() {
        let sink = RecordingSink::new();
        let thread =
            reconstruct_thread(EMPTY_NESTED_MESSAGE.as_bytes(), DEFAULT_MAX_DEPTH, &sink).unwrap();

        assert_eq!(thread.message_count, 1);
        assert!(thread.metadata.is_single_message);
        assert_eq!(thread.messages[0].message_id, "o@x");
        assert!(thread.participants.iter().all(|p| p.address != UNKNOWN_ADDRESS));
        assert!(!thread.combined_text.contains(UNKNOWN_ADDRESS));

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], PipelineEvent::NestedMessageSkipped { depth: 1, .. }));
    }
}
