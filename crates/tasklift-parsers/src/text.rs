//! Plain text and markdown

use crate::mime;
use tasklift_domain::{DocumentParser, ParseError, ParsedDocument};

/// Parser for text inputs; invalid UTF-8 is replaced, never rejected
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn parse(&self, bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
        let text = String::from_utf8_lossy(bytes).into_owned();
        Ok(ParsedDocument::from_text(text))
    }

    fn supports(&self, mime_type: &str) -> bool {
        mime::TEXT.contains(&mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_utf8() {
        let doc = PlainTextParser.parse("Alex to send the deck".as_bytes()).unwrap();
        assert_eq!(doc.text, "Alex to send the deck");
        assert_eq!(doc.metadata.word_count, 5);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let doc = PlainTextParser.parse(&[b'o', b'k', 0xff, b'!']).unwrap();
        assert_eq!(doc.text, "ok\u{fffd}!");
    }

    #[test]
    fn test_supports_markdown() {
        assert!(PlainTextParser.supports("text/markdown"));
        assert!(!PlainTextParser.supports("application/pdf"));
    }
}
