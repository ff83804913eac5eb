//! Position utilities.
//!
//! LSP positions count characters in UTF-16 code units; the engine and the
//! providers work with byte offsets into the document text. `LineIndex`
//! converts between the two.

use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = Vec::with_capacity(128);
        line_starts.push(0);
        for (idx, b) in text.as_bytes().iter().enumerate() {
            if *b == b'\n' {
                line_starts.push(idx + 1);
            }
        }
        Self { text, line_starts }
    }

    pub fn offset_of(&self, position: Position) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let character = usize::try_from(position.character).ok()?;
        let line_start = *self.line_starts.get(line)?;
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(self.text.len());

        let mut units = 0usize;
        for (idx, ch) in self.text[line_start..line_end].char_indices() {
            if units >= character {
                return (units == character).then_some(line_start + idx);
            }
            units += ch.len_utf16();
        }
        (units == character).then_some(line_end)
    }

    pub fn position_of(&self, offset: usize) -> Position {
        let mut clamped = offset.min(self.text.len());
        while !self.text.is_char_boundary(clamped) {
            clamped -= 1;
        }
        let line = match self.line_starts.binary_search(&clamped) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let character = self.text[line_start..clamped].encode_utf16().count();
        Position {
            line: line as u32,
            character: character as u32,
        }
    }

    pub fn range_of(&self, start: usize, end: usize) -> Range {
        Range {
            start: self.position_of(start),
            end: self.position_of(end),
        }
    }

    /// Byte offset just past the last character of `line`, newline excluded.
    pub fn line_end(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let content = &self.text[self.line_starts[line]..end];
        Some(self.line_starts[line] + content.trim_end_matches('\r').len())
    }

    /// The identifier under `position`, as a byte range plus its text.
    ///
    /// Identifiers are maximal runs of alphanumerics, `_` and `.`; dots at
    /// either end are not part of the word. A cursor sitting just after the
    /// last character still selects the word.
    pub fn word_at(&self, position: Position) -> Option<(usize, usize, &'a str)> {
        let offset = self.offset_of(position)?;
        let text = self.text;

        let start = text[..offset]
            .char_indices()
            .rev()
            .take_while(|(_, ch)| is_word_char(*ch))
            .last()
            .map(|(idx, _)| idx)
            .unwrap_or(offset);
        let end = text[offset..]
            .char_indices()
            .find(|(_, ch)| !is_word_char(*ch))
            .map(|(idx, _)| offset + idx)
            .unwrap_or(text.len());

        let raw = &text[start..end];
        let trimmed_start = raw.len() - raw.trim_start_matches('.').len();
        let word = raw.trim_matches('.');
        if word.is_empty() {
            return None;
        }
        let start = start + trimmed_start;
        Some((start, start + word.len(), word))
    }
}

pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}
