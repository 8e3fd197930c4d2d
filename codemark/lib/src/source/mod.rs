//! Line-text accessors and the host capabilities that supply them.
//!
//! Every parsing and measurement step receives an explicit [`LineSource`]
//! instead of reaching into ambient host state. Two implementations exist:
//!
//! - [`TextBuffer`] - the addressable buffer of a document open for editing
//! - [`RecoveredText`] - a whole file's text read back from storage
//!
//! The structural side lives in [`sections`] and the storage side in [`vault`].

pub mod sections;
pub mod vault;

pub use sections::{SectionIndex, SectionInfo, SectionKind, SectionResolver, index_sections};
pub use vault::{FileReader, FsVault, MemoryVault};

use std::ops::Range;

/// Read access to a document's lines by 0-based index.
pub trait LineSource {
    /// Text of the line at `index`, without its line terminator.
    fn line(&self, index: usize) -> Option<&str>;

    /// Number of lines in the document.
    fn line_count(&self) -> usize;

    /// Copies `count` lines starting at `start`, stopping early at the end of
    /// the document.
    fn snapshot(&self, start: usize, count: usize) -> Vec<String> {
        (start..start.saturating_add(count))
            .map_while(|index| self.line(index).map(str::to_string))
            .collect()
    }
}

/// A line of a [`TextBuffer`], addressed by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the line start.
    pub from: usize,
    /// Byte offset of the line end (before the terminator).
    pub to: usize,
    /// Line text without its terminator.
    pub text: &'a str,
}

/// An editable text buffer with a line-offset table.
///
/// ## Examples
///
/// ```
/// use codemark_lib::source::{LineSource, TextBuffer};
///
/// let buffer = TextBuffer::new("a\nbc\n");
/// assert_eq!(buffer.line_count(), 3);
/// assert_eq!(buffer.line(1), Some("bc"));
/// assert_eq!(buffer.line_at(3).number, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    line_starts: Vec<usize>,
}

impl TextBuffer {
    /// Creates a buffer holding `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = line_starts(&text);
        Self { text, line_starts }
    }

    /// Full buffer text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Byte offset where the 0-based line `index` starts.
    pub fn line_start(&self, index: usize) -> Option<usize> {
        self.line_starts.get(index).copied()
    }

    /// The line containing byte offset `pos` (clamped to the buffer).
    pub fn line_at(&self, pos: usize) -> Line<'_> {
        let pos = pos.min(self.text.len());
        let index = match self.line_starts.binary_search(&pos) {
            Ok(index) => index,
            Err(insert) => insert.saturating_sub(1),
        };
        self.line_by_index(index)
    }

    /// The 0-based line `index`, or the last line when out of range.
    fn line_by_index(&self, index: usize) -> Line<'_> {
        let index = index.min(self.line_starts.len().saturating_sub(1));
        let from = self.line_starts.get(index).copied().unwrap_or(0);
        let to = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        let text = self.text[from..to].strip_suffix('\r').unwrap_or(&self.text[from..to]);
        Line {
            number: index + 1,
            from,
            to: from + text.len(),
            text,
        }
    }

    /// Replaces the byte range `range` with `insert`, rebuilding the offsets.
    ///
    /// Out-of-range or non-boundary positions are clamped back to the nearest
    /// preceding char boundary.
    pub fn replace(&mut self, range: Range<usize>, insert: &str) {
        let start = floor_boundary(&self.text, range.start);
        let end = floor_boundary(&self.text, range.end.max(range.start));
        self.text.replace_range(start..end, insert);
        self.line_starts = line_starts(&self.text);
    }
}

impl LineSource for TextBuffer {
    fn line(&self, index: usize) -> Option<&str> {
        if index >= self.line_starts.len() {
            return None;
        }
        Some(self.line_by_index(index).text)
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// A file's text recovered from storage, split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveredText {
    lines: Vec<String>,
}

impl RecoveredText {
    /// Splits `text` on `\n`, dropping a trailing `\r` from each line.
    pub fn new(text: &str) -> Self {
        Self {
            lines: text
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect(),
        }
    }
}

impl LineSource for RecoveredText {
    fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    fn line_count(&self) -> usize {
        self.lines.len()
    }
}

pub(crate) fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(offset, _)| offset + 1))
        .collect()
}

fn floor_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_lines() {
        let buffer = TextBuffer::new("one\ntwo\r\nthree");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line(0), Some("one"));
        assert_eq!(buffer.line(1), Some("two"));
        assert_eq!(buffer.line(2), Some("three"));
        assert_eq!(buffer.line(3), None);
    }

    #[test]
    fn test_buffer_trailing_newline_adds_empty_line() {
        let buffer = TextBuffer::new("a\n");
        assert_eq!(buffer.line_count(), 2);
        assert_eq!(buffer.line(1), Some(""));
    }

    #[test]
    fn test_line_at_positions() {
        let buffer = TextBuffer::new("ab\ncd\nef");
        let line = buffer.line_at(0);
        assert_eq!((line.number, line.from, line.to, line.text), (1, 0, 2, "ab"));
        // The newline belongs to the line it ends.
        assert_eq!(buffer.line_at(2).number, 1);
        assert_eq!(buffer.line_at(3).number, 2);
        assert_eq!(buffer.line_at(4).text, "cd");
        let last = buffer.line_at(100);
        assert_eq!((last.number, last.from, last.to), (3, 6, 8));
    }

    #[test]
    fn test_line_start() {
        let buffer = TextBuffer::new("ab\ncd");
        assert_eq!(buffer.line_start(0), Some(0));
        assert_eq!(buffer.line_start(1), Some(3));
        assert_eq!(buffer.line_start(2), None);
    }

    #[test]
    fn test_replace_rebuilds_offsets() {
        let mut buffer = TextBuffer::new("ab\ncd");
        buffer.replace(2..2, "\nxx");
        assert_eq!(buffer.text(), "ab\nxx\ncd");
        assert_eq!(buffer.line_count(), 3);
        assert_eq!(buffer.line(1), Some("xx"));

        buffer.replace(0..3, "");
        assert_eq!(buffer.line(0), Some("xx"));
    }

    #[test]
    fn test_replace_clamps_to_char_boundary() {
        let mut buffer = TextBuffer::new("é");
        buffer.replace(1..2, "x");
        assert_eq!(buffer.text(), "x");
    }

    #[test]
    fn test_recovered_text() {
        let text = RecoveredText::new("a\r\nb\n");
        assert_eq!(text.line_count(), 3);
        assert_eq!(text.line(0), Some("a"));
        assert_eq!(text.line(1), Some("b"));
        assert_eq!(text.line(2), Some(""));
    }

    #[test]
    fn test_snapshot_stops_at_end() {
        let text = RecoveredText::new("a\nb\nc");
        assert_eq!(text.snapshot(1, 5), vec!["b", "c"]);
        assert!(text.snapshot(9, 2).is_empty());
    }
}
