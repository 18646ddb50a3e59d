//! Thread assembly from a flat list of messages

use super::clean::clean_subject;
use chrono::SecondsFormat;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tasklift_domain::{EmailMessage, EmailThread, Mailbox, ParseError, ThreadingMetadata};

/// Order messages by send date; undated messages go last, ties keep input order
fn chronological(a: &EmailMessage, b: &EmailMessage) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Build a thread from messages collected at any depth
pub fn build_thread(mut messages: Vec<EmailMessage>) -> Result<EmailThread, ParseError> {
    if messages.is_empty() {
        return Err(ParseError::Malformed("email contains no messages".to_string()));
    }

    messages.sort_by(chronological);

    let root = messages
        .iter()
        .find(|m| m.in_reply_to.is_none())
        .unwrap_or(&messages[0]);
    let root_message_id = root.message_id.clone();
    let subject = clean_subject(&root.subject);

    let participants = collect_participants(&messages);
    let orphaned_messages = find_orphans(&messages);

    let start_date = messages.iter().find_map(|m| m.date);
    let last_date = messages.iter().rev().find_map(|m| m.date);
    let combined_text = render_combined(&messages);
    let message_count = messages.len();

    Ok(EmailThread {
        root_message_id,
        subject,
        participants,
        start_date,
        last_date,
        message_count,
        combined_text,
        metadata: ThreadingMetadata {
            threading_complete: orphaned_messages.is_empty(),
            orphaned_messages,
            is_single_message: message_count == 1,
        },
        messages,
    })
}

/// Distinct mailboxes from every From/To/Cc, keyed by lowercased address
///
/// The first name seen for an address wins; a later name only fills a gap.
fn collect_participants(messages: &[EmailMessage]) -> Vec<Mailbox> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut participants: Vec<Mailbox> = Vec::new();

    let all = messages
        .iter()
        .flat_map(|m| std::iter::once(&m.from).chain(m.to.iter()).chain(m.cc.iter()));

    for mailbox in all {
        match index.get(&mailbox.key()) {
            Some(&i) => {
                if participants[i].name.is_none() && mailbox.name.is_some() {
                    participants[i].name = mailbox.name.clone();
                }
            }
            None => {
                index.insert(mailbox.key(), participants.len());
                participants.push(mailbox.clone());
            }
        }
    }

    participants
}

/// In-Reply-To ids that match no message in the set
fn find_orphans(messages: &[EmailMessage]) -> Vec<String> {
    let known: HashSet<&str> = messages.iter().map(|m| m.message_id.as_str()).collect();
    messages
        .iter()
        .filter_map(|m| m.in_reply_to.as_deref())
        .filter(|parent| !known.contains(parent))
        .map(str::to_string)
        .collect()
}

fn render_combined(messages: &[EmailMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let when = m
                .date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_else(|| "unknown date".to_string());
            let mut block = format!("--- Message from {} on {} ---\n", m.from.display_name(), when);
            if !m.subject.is_empty() {
                block.push_str("Subject: ");
                block.push_str(&m.subject);
                block.push('\n');
            }
            block.push_str(&m.body);
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(id: &str, reply_to: Option<&str>, day: u32, from: Mailbox) -> EmailMessage {
        EmailMessage {
            message_id: id.to_string(),
            in_reply_to: reply_to.map(str::to_string),
            references: Vec::new(),
            subject: "Re: Launch plan".to_string(),
            from,
            to: Vec::new(),
            cc: Vec::new(),
            date: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).single(),
            body: format!("body {}", id),
            raw_body: format!("body {}", id),
            is_attachment: false,
            depth: 0,
            attachments: Vec::new(),
        }
    }

    fn alex() -> Mailbox {
        Mailbox::new(Some("Alex".to_string()), "alex@example.com")
    }

    #[test]
    fn test_orphaned_reply_breaks_threading() {
        let mut m1 = message("m1", None, 1, alex());
        m1.subject = "Launch plan".to_string();
        m1.to = vec![Mailbox::new(Some("Bo".to_string()), "bo@example.com")];
        let mut m2 = message("m2", Some("m1"), 2, Mailbox::new(None, "BO@example.com"));
        m2.to = vec![Mailbox::new(None, "Alex@Example.com")];
        let m3 = message("m3", Some("lost@example.com"), 3, alex());

        // Input order is deliberately not chronological
        let thread = build_thread(vec![m3, m1, m2]).unwrap();

        assert!(!thread.metadata.threading_complete);
        assert_eq!(thread.metadata.orphaned_messages, vec!["lost@example.com"]);
        assert_eq!(thread.root_message_id, "m1");
        assert_eq!(thread.message_count, 3);
        assert!(!thread.metadata.is_single_message);

        let ids: Vec<&str> = thread.messages.iter().map(|m| m.message_id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "m2", "m3"]);

        let addresses: Vec<String> = thread.participants.iter().map(|p| p.key()).collect();
        assert_eq!(addresses, vec!["alex@example.com", "bo@example.com"]);
        assert_eq!(thread.participants[1].name.as_deref(), Some("Bo"));
    }

    #[test]
    fn test_subject_cleaned_from_root() {
        let m1 = message("m1", None, 1, alex());
        let thread = build_thread(vec![m1]).unwrap();
        assert_eq!(thread.subject, "Launch plan");
        assert!(thread.metadata.threading_complete);
        assert!(thread.metadata.is_single_message);
    }

    #[test]
    fn test_root_falls_back_to_earliest() {
        let a = message("a", Some("x"), 5, alex());
        let b = message("b", Some("y"), 4, alex());
        let thread = build_thread(vec![a, b]).unwrap();
        assert_eq!(thread.root_message_id, "b");
        assert_eq!(thread.metadata.orphaned_messages, vec!["y", "x"]);
    }

    #[test]
    fn test_participant_name_filled_later() {
        let mut m1 = message("m1", None, 1, Mailbox::new(None, "dana@example.com"));
        m1.cc = vec![Mailbox::new(Some("Eve".to_string()), "eve@example.com")];
        let m2 = message(
            "m2",
            Some("m1"),
            2,
            Mailbox::new(Some("Dana".to_string()), "Dana@example.com"),
        );
        let thread = build_thread(vec![m1, m2]).unwrap();
        assert_eq!(thread.participants[0].display_name(), "Dana");
        assert_eq!(thread.participants[0].address, "dana@example.com");
        assert_eq!(thread.participants.len(), 2);
    }

    #[test]
    fn test_combined_text_format() {
        let m1 = message("m1", None, 1, alex());
        let mut m2 = message("m2", Some("m1"), 2, Mailbox::new(None, "bo@example.com"));
        m2.date = None;
        let thread = build_thread(vec![m2, m1]).unwrap();

        assert_eq!(
            thread.combined_text,
            "--- Message from Alex on 2024-01-01T09:00:00.000Z ---\nSubject: Re: Launch plan\nbody m1\n\n\
--- Message from bo@example.com on unknown date ---\nSubject: Re: Launch plan\nbody m2"
        );
        assert_eq!(thread.start_date, thread.last_date);
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(build_thread(Vec::new()).is_err());
    }
}
