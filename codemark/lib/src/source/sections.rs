//! Structural section index of a markdown document.
//!
//! A section is a block-level region with a line extent. Code sections span
//! from the fence-open line to the fence-close line (both 0-based), so the
//! number of content lines is `line_end - line_start - 1`.

use crate::dom::{Document, NodeId};
use pulldown_cmark::{Event, Options, Parser, Tag};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Kind of a structural section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Code,
    Heading,
    Paragraph,
    Other,
}

/// One section of a document, with 0-based inclusive line bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionInfo {
    pub kind: SectionKind,
    pub line_start: usize,
    pub line_end: usize,
}

impl SectionInfo {
    /// Creates a code section.
    pub fn code(line_start: usize, line_end: usize) -> Self {
        Self {
            kind: SectionKind::Code,
            line_start,
            line_end,
        }
    }
}

/// Host lookup of the structural sections of a stored document.
pub trait SectionIndex {
    /// Ordered sections of the document at `path`; empty when unknown.
    fn sections(&self, path: &Path) -> Vec<SectionInfo>;

    /// Only the code sections, in document order.
    fn code_sections(&self, path: &Path) -> Vec<SectionInfo> {
        self.sections(path)
            .into_iter()
            .filter(|section| section.kind == SectionKind::Code)
            .collect()
    }
}

/// Host lookup resolving a rendered node to its section of the live buffer.
///
/// Returning `None` means the node is not backed by an addressable buffer.
pub trait SectionResolver {
    fn section_info(&self, doc: &Document, node: NodeId) -> Option<SectionInfo>;
}

impl SectionResolver for HashMap<NodeId, SectionInfo> {
    fn section_info(&self, _doc: &Document, node: NodeId) -> Option<SectionInfo> {
        self.get(&node).copied()
    }
}

/// Markdown options shared by the section index and the static renderer, so
/// both see the same code blocks in the same order.
pub(crate) fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Builds the section index of a markdown document.
///
/// Top-level blocks become sections. Code blocks are recorded at any nesting
/// depth, since each one renders its own `<pre><code>`. An unclosed fence gets
/// a virtual close line just past the end of the document.
///
/// ## Examples
///
/// ```
/// use codemark_lib::source::{SectionInfo, SectionKind, index_sections};
///
/// let sections = index_sections("# Title\n\n```rust\nfn main() {}\n```\n");
/// assert_eq!(sections[0].kind, SectionKind::Heading);
/// assert_eq!(sections[1], SectionInfo::code(2, 4));
/// ```
pub fn index_sections(text: &str) -> Vec<SectionInfo> {
    let starts = super::line_starts(text);
    let mut sections = Vec::new();
    let mut depth = 0usize;

    for (event, range) in Parser::new_ext(text, markdown_options()).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                let line_start = line_of(&starts, range.start);
                let line_end = line_of(&starts, range.end.saturating_sub(1).max(range.start));
                match tag {
                    Tag::CodeBlock(_) => {
                        let (line_end, _) = code_block_close(text, &starts, line_start, line_end);
                        sections.push(SectionInfo::code(line_start, line_end));
                    }
                    _ if depth == 0 => sections.push(SectionInfo {
                        kind: section_kind(&tag),
                        line_start,
                        line_end,
                    }),
                    _ => {}
                }
                depth += 1;
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Rule if depth == 0 => {
                let line = line_of(&starts, range.start);
                sections.push(SectionInfo {
                    kind: SectionKind::Other,
                    line_start: line,
                    line_end: line,
                });
            }
            _ => {}
        }
    }

    sections
}

/// Close line of a code block whose event range ends on `last_line`, and
/// whether that line is a real fence close. Without one, the close is the
/// virtual line just past `last_line`.
pub(crate) fn code_block_close(
    text: &str,
    starts: &[usize],
    line_start: usize,
    last_line: usize,
) -> (usize, bool) {
    if last_line > line_start && is_fence_close(line_text(text, starts, last_line)) {
        (last_line, true)
    } else {
        (last_line + 1, false)
    }
}

/// Line index holding byte `offset`.
pub(crate) fn line_of(starts: &[usize], offset: usize) -> usize {
    match starts.binary_search(&offset) {
        Ok(index) => index,
        Err(insert) => insert.saturating_sub(1),
    }
}

fn section_kind(tag: &Tag<'_>) -> SectionKind {
    match tag {
        Tag::CodeBlock(_) => SectionKind::Code,
        Tag::Heading { .. } => SectionKind::Heading,
        Tag::Paragraph => SectionKind::Paragraph,
        _ => SectionKind::Other,
    }
}

fn line_text<'a>(text: &'a str, starts: &[usize], index: usize) -> &'a str {
    let from = starts.get(index).copied().unwrap_or(text.len());
    let to = starts.get(index + 1).map(|next| next - 1).unwrap_or(text.len());
    &text[from..to.max(from)]
}

/// A closing fence line, possibly inside block-quote markers.
fn is_fence_close(line: &str) -> bool {
    let fence = line
        .trim_start_matches(|c: char| c == '>' || c.is_whitespace())
        .trim_end();
    fence.len() >= 3 && (fence.chars().all(|c| c == '`') || fence.chars().all(|c| c == '~'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(sections: &[SectionInfo]) -> Vec<SectionInfo> {
        sections
            .iter()
            .copied()
            .filter(|s| s.kind == SectionKind::Code)
            .collect()
    }

    #[test]
    fn test_single_code_block() {
        let sections = index_sections("```python\na\nb\nc\n```\n");
        assert_eq!(sections, vec![SectionInfo::code(0, 4)]);
    }

    #[test]
    fn test_code_block_without_trailing_newline() {
        let sections = index_sections("text\n\n```rs\nx\n```");
        assert_eq!(code(&sections), vec![SectionInfo::code(2, 4)]);
    }

    #[test]
    fn test_multiple_blocks_in_order() {
        let text = "# A\n\n```js\n1\n```\n\npara\n\n~~~py\n1\n2\n~~~\n";
        let sections = index_sections(text);
        assert_eq!(
            sections.iter().map(|s| s.kind).collect::<Vec<_>>(),
            vec![
                SectionKind::Heading,
                SectionKind::Code,
                SectionKind::Paragraph,
                SectionKind::Code
            ]
        );
        assert_eq!(
            code(&sections),
            vec![SectionInfo::code(2, 4), SectionInfo::code(8, 11)]
        );
    }

    #[test]
    fn test_unclosed_fence_gets_virtual_close() {
        let sections = index_sections("```rust\na\nb");
        assert_eq!(sections, vec![SectionInfo::code(0, 3)]);
    }

    #[test]
    fn test_empty_unclosed_fence() {
        let sections = index_sections("```rust");
        assert_eq!(sections, vec![SectionInfo::code(0, 1)]);
    }

    #[test]
    fn test_nested_code_block_in_list() {
        let text = "- item\n\n  ```sh\n  ls\n  ```\n";
        let sections = index_sections(text);
        assert_eq!(sections[0].kind, SectionKind::Other);
        assert_eq!(code(&sections), vec![SectionInfo::code(2, 4)]);
    }

    #[test]
    fn test_code_block_in_blockquote() {
        let text = "> ```sh\n> ls\n> ```\n";
        assert_eq!(code(&index_sections(text)), vec![SectionInfo::code(0, 2)]);
    }

    #[test]
    fn test_fence_close_detection() {
        assert!(is_fence_close("```"));
        assert!(is_fence_close("  ~~~~  "));
        assert!(is_fence_close("> ```"));
        assert!(!is_fence_close("``"));
        assert!(!is_fence_close("```rust"));
        assert!(!is_fence_close("`~`"));
    }

    #[test]
    fn test_resolver_from_map() {
        let mut doc = Document::new();
        let node = doc.create_element("code");
        let mut map = HashMap::new();
        map.insert(node, SectionInfo::code(3, 6));
        assert_eq!(map.section_info(&doc, node), Some(SectionInfo::code(3, 6)));
        let other = doc.create_element("code");
        assert_eq!(map.section_info(&doc, other), None);
    }
}
