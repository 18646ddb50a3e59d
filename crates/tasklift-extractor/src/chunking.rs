//! Overlapping text windows with sentence-aware break points

use crate::types::TextChunk;

/// Splits cleaned text into overlapping chunks
///
/// Each window ends at the last `.` or newline found in its final 30%,
/// or at the hard size limit when there is none. Consecutive windows
/// share up to `overlap` bytes.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker
    ///
    /// `overlap` is expected to be below 70% of `max_size`; the
    /// extractor configuration enforces this.
    pub fn new(max_size: usize, overlap: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            overlap,
        }
    }

    /// Split `text` into chunks
    ///
    /// Text no longer than the window comes back as a single chunk,
    /// unchanged. Offsets always fall on character boundaries.
    pub fn chunk(&self, text: &str) -> Vec<TextChunk> {
        let len = text.len();
        if len <= self.max_size {
            return vec![TextChunk {
                index: 0,
                text: text.to_string(),
                start_offset: 0,
                end_offset: len,
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let mut end = floor_char_boundary(text, (start + self.max_size).min(len));
            if end <= start {
                end = next_char_boundary(text, start);
            }

            if end < len {
                let search_from = start + self.max_size * 7 / 10;
                if let Some(pos) = last_break(text, search_from, end) {
                    end = pos + 1;
                }
            }

            chunks.push(TextChunk {
                index: chunks.len(),
                text: text[start..end].trim().to_string(),
                start_offset: start,
                end_offset: end,
            });

            if end >= len {
                break;
            }

            let next = floor_char_boundary(text, end.saturating_sub(self.overlap));
            start = if next > start { next } else { end };
        }

        chunks
    }
}

/// Position of the last `.` or `\n` in `text[from..to]`
fn last_break(text: &str, from: usize, to: usize) -> Option<usize> {
    if from >= to {
        return None;
    }
    text.as_bytes()[from..to]
        .iter()
        .rposition(|b| *b == b'.' || *b == b'\n')
        .map(|p| from + p)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    let mut next = index + 1;
    while next < text.len() && !text.is_char_boundary(next) {
        next += 1;
    }
    next.min(text.len())
}
