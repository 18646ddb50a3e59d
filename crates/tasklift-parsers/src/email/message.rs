//! Conversion from parsed MIME messages to domain messages

use super::clean::{clean_body, html_to_text};
use chrono::{DateTime, Utc};
use mail_parser::{Address, HeaderValue, Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tasklift_domain::email::UNKNOWN_ADDRESS;
use tasklift_domain::{AttachmentInfo, EmailMessage, EventSink, Mailbox, ParseError, PipelineEvent};
use tracing::warn;

/// Subject used when a message has none
pub const NO_SUBJECT: &str = "(No Subject)";

/// Walks a root message and every nested message below it
pub(crate) struct MessageCollector<'a> {
    max_depth: usize,
    sink: &'a dyn EventSink,
    generated_ids: usize,
    messages: Vec<EmailMessage>,
}

impl<'a> MessageCollector<'a> {
    pub(crate) fn new(max_depth: usize, sink: &'a dyn EventSink) -> Self {
        Self {
            max_depth,
            sink,
            generated_ids: 0,
            messages: Vec::new(),
        }
    }

    /// Parse raw bytes as the root message and collect everything below it
    pub(crate) fn collect_root(mut self, bytes: &[u8]) -> Result<Vec<EmailMessage>, ParseError> {
        let root = MessageParser::default()
            .parse(bytes)
            .ok_or_else(|| ParseError::Malformed("not an RFC 822 message".to_string()))?;
        self.visit(&root, 0)?;
        Ok(self.messages)
    }

    /// Parse raw bytes as a single message, ignoring nested messages
    pub(crate) fn convert_root(mut self, bytes: &[u8]) -> Result<EmailMessage, ParseError> {
        let root = MessageParser::default()
            .parse(bytes)
            .ok_or_else(|| ParseError::Malformed("not an RFC 822 message".to_string()))?;
        Ok(self.convert(&root, 0))
    }

    fn visit(&mut self, message: &Message<'_>, depth: usize) -> Result<(), ParseError> {
        let converted = self.convert(message, depth);
        self.messages.push(converted);

        for part in attachment_parts(message) {
            if !is_message_part(part) {
                continue;
            }

            let child_depth = depth + 1;
            if child_depth > self.max_depth {
                return Err(ParseError::DepthExceeded {
                    limit: self.max_depth,
                });
            }

            match &part.body {
                PartType::Message(nested) => self.visit_nested(nested, child_depth)?,
                PartType::Binary(raw) | PartType::InlineBinary(raw) => {
                    let raw: &[u8] = raw;
                    match MessageParser::default().parse(raw) {
                        Some(nested) => self.visit_nested(&nested, child_depth)?,
                        None => self.skip(child_depth, "embedded message could not be parsed"),
                    }
                }
                PartType::Text(raw) => match MessageParser::default().parse(raw.as_bytes()) {
                    Some(nested) => self.visit_nested(&nested, child_depth)?,
                    None => self.skip(child_depth, "embedded message could not be parsed"),
                },
                _ => self.skip(child_depth, "unexpected body for message/rfc822 part"),
            }
        }

        Ok(())
    }

    /// A nested message without headers or body is a failed parse
    fn visit_nested(&mut self, message: &Message<'_>, depth: usize) -> Result<(), ParseError> {
        if message.headers().is_empty() && body_text(message).trim().is_empty() {
            self.skip(depth, "embedded message has no headers or body");
            return Ok(());
        }
        self.visit(message, depth)
    }

    fn skip(&self, depth: usize, reason: &str) {
        warn!(depth, reason, "Failed to parse nested email");
        self.sink.emit(PipelineEvent::NestedMessageSkipped {
            depth,
            reason: reason.to_string(),
        });
    }

    fn convert(&mut self, message: &Message<'_>, depth: usize) -> EmailMessage {
        let raw_body = body_text(message);
        let message_id = match message.message_id() {
            Some(id) if !id.trim().is_empty() => strip_brackets(id),
            _ => {
                self.generated_ids += 1;
                format!("generated-{}", self.generated_ids)
            }
        };

        let in_reply_to = header_ids(message.in_reply_to()).into_iter().next();

        let subject = message
            .subject()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(NO_SUBJECT)
            .to_string();

        let from = message
            .from()
            .and_then(|addr| mailboxes(addr).into_iter().next())
            .unwrap_or_else(|| Mailbox::new(None, UNKNOWN_ADDRESS));

        EmailMessage {
            message_id,
            in_reply_to,
            references: header_ids(message.references()),
            subject,
            from,
            to: message.to().map(mailboxes).unwrap_or_default(),
            cc: message.cc().map(mailboxes).unwrap_or_default(),
            date: message
                .date()
                .and_then(|d| DateTime::<Utc>::from_timestamp(d.to_timestamp(), 0)),
            body: clean_body(&raw_body),
            raw_body,
            is_attachment: depth > 0,
            depth,
            attachments: attachment_parts(message)
                .filter(|part| !is_message_part(part))
                .map(attachment_info)
                .collect(),
        }
    }
}

fn attachment_parts<'m, 'x>(message: &'m Message<'x>) -> impl Iterator<Item = &'m MessagePart<'x>> {
    message
        .attachments
        .iter()
        .filter_map(|id| message.parts.get(*id as usize))
}

fn is_message_part(part: &MessagePart<'_>) -> bool {
    if matches!(part.body, PartType::Message(_)) {
        return true;
    }
    part.content_type()
        .map(|ct| {
            ct.ctype().eq_ignore_ascii_case("message")
                && ct
                    .subtype()
                    .map(|s| s.eq_ignore_ascii_case("rfc822"))
                    .unwrap_or(false)
        })
        .unwrap_or(false)
}

fn attachment_info(part: &MessagePart<'_>) -> AttachmentInfo {
    let content_type = part
        .content_type()
        .map(|ct| match ct.subtype() {
            Some(sub) => format!("{}/{}", ct.ctype(), sub),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());

    AttachmentInfo {
        filename: part.attachment_name().unwrap_or("unknown").to_string(),
        content_type,
        size: part.contents().len(),
    }
}

/// Plain-text body, falling back to the HTML body converted to text
fn body_text(message: &Message<'_>) -> String {
    let plain: Vec<&str> = message
        .text_body
        .iter()
        .filter_map(|id| message.parts.get(*id as usize))
        .filter_map(|part| match &part.body {
            PartType::Text(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect();
    if !plain.is_empty() {
        return plain.join("\n");
    }

    let html: Vec<String> = message
        .html_body
        .iter()
        .filter_map(|id| message.parts.get(*id as usize))
        .filter_map(|part| match &part.body {
            PartType::Html(html) => Some(html_to_text(html)),
            _ => None,
        })
        .collect();
    html.join("\n")
}

fn strip_brackets(id: &str) -> String {
    id.trim().trim_start_matches('<').trim_end_matches('>').trim().to_string()
}

/// Message ids from In-Reply-To or References
fn header_ids(value: &HeaderValue<'_>) -> Vec<String> {
    let raw: Vec<&str> = match value {
        HeaderValue::Text(text) => vec![text.as_ref()],
        HeaderValue::TextList(list) => list.iter().map(|t| t.as_ref()).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .flat_map(|s| s.split_whitespace())
        .map(strip_brackets)
        .filter(|id| !id.is_empty())
        .collect()
}

fn mailboxes(address: &Address<'_>) -> Vec<Mailbox> {
    let to_mailbox = |addr: &mail_parser::Addr<'_>| {
        Mailbox::new(
            addr.name.as_ref().map(|n| n.trim().to_string()),
            addr.address
                .as_ref()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string()),
        )
    };

    match address {
        Address::List(list) => list.iter().map(to_mailbox).collect(),
        Address::Group(groups) => groups
            .iter()
            .flat_map(|g| g.addresses.iter())
            .map(to_mailbox)
            .collect(),
    }
}
