//! Line-level syntax nodes of an editor buffer.
//!
//! The decoration builder only needs to know, per line, whether it opens a
//! fenced block, sits inside one, or closes one, and how to step to the
//! neighbouring line. [`SyntaxTree`] is that capability; [`FenceSyntaxTree`]
//! derives it from a [`TextBuffer`] with the same CommonMark parser the
//! section index and the static renderer use, so fences nested in block
//! quotes or list items are found in every context.

use crate::source::{TextBuffer, line_starts};
use crate::source::sections::{code_block_close, line_of, markdown_options};
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag};

/// Classification of one line node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Fence-open line of a code block.
    FenceOpen,
    /// Content line inside a code block.
    FenceLine,
    /// Fence-close line of a code block.
    FenceClose,
    /// Any line outside a code block.
    Text,
}

/// A line node with its byte span in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    pub from: usize,
    pub to: usize,
    /// 0-based line index.
    pub index: usize,
}

/// Typed node iteration with sibling navigation.
pub trait SyntaxTree {
    /// Nodes overlapping `from..=to`, in document order.
    fn nodes(&self, from: usize, to: usize) -> impl Iterator<Item = SyntaxNode> + '_;

    fn next_sibling(&self, node: &SyntaxNode) -> Option<SyntaxNode>;

    fn prev_sibling(&self, node: &SyntaxNode) -> Option<SyntaxNode>;
}

/// Syntax nodes computed from a buffer's lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FenceSyntaxTree {
    nodes: Vec<SyntaxNode>,
}

impl FenceSyntaxTree {
    /// Classifies every line of `buffer`.
    ///
    /// Each fenced code block marks its opening line, its content lines and,
    /// when present, its closing line. An unclosed fence runs to the end of
    /// its container. Indented code blocks carry no fence and stay text.
    pub fn parse(buffer: &TextBuffer) -> Self {
        let text = buffer.text();
        let starts = line_starts(text);
        let mut kinds = vec![NodeKind::Text; starts.len()];

        for (event, range) in Parser::new_ext(text, markdown_options()).into_offset_iter() {
            let Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) = event else {
                continue;
            };
            let open = line_of(&starts, range.start);
            let last = line_of(&starts, range.end.saturating_sub(1).max(range.start));
            let (close, closed) = code_block_close(text, &starts, open, last);

            kinds[open] = NodeKind::FenceOpen;
            for kind in kinds.iter_mut().take(close).skip(open + 1) {
                *kind = NodeKind::FenceLine;
            }
            if closed {
                kinds[close] = NodeKind::FenceClose;
            }
        }

        let nodes = kinds
            .into_iter()
            .enumerate()
            .map(|(index, kind)| {
                let from = starts[index];
                let line_end = starts.get(index + 1).map_or(text.len(), |next| next - 1);
                let line = &text[from..line_end];
                SyntaxNode {
                    kind,
                    from,
                    to: from + line.strip_suffix('\r').unwrap_or(line).len(),
                    index,
                }
            })
            .collect();

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl SyntaxTree for FenceSyntaxTree {
    fn nodes(&self, from: usize, to: usize) -> impl Iterator<Item = SyntaxNode> + '_ {
        let first = self.nodes.partition_point(|node| node.to < from);
        self.nodes[first..]
            .iter()
            .take_while(move |node| node.from <= to)
            .copied()
    }

    fn next_sibling(&self, node: &SyntaxNode) -> Option<SyntaxNode> {
        self.nodes.get(node.index + 1).copied()
    }

    fn prev_sibling(&self, node: &SyntaxNode) -> Option<SyntaxNode> {
        node.index
            .checked_sub(1)
            .and_then(|index| self.nodes.get(index))
            .copied()
    }
}

/// The part of a fence-open line from its fence run on, without the
/// block-quote markers, list markers or indentation of its containers.
///
/// ```
/// use codemark_lib::live::syntax::fence_run;
///
/// assert_eq!(fence_run("> ```rs TI:\"a\""), "```rs TI:\"a\"");
/// assert_eq!(fence_run("    ~~~sh"), "~~~sh");
/// assert_eq!(fence_run("plain"), "plain");
/// ```
pub fn fence_run(line: &str) -> &str {
    let at = [line.find("```"), line.find("~~~")]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(0);
    &line[at..]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<NodeKind> {
        let tree = FenceSyntaxTree::parse(&TextBuffer::new(text));
        tree.nodes(0, usize::MAX).map(|node| node.kind).collect()
    }

    #[test]
    fn test_classifies_block() {
        use NodeKind::*;
        assert_eq!(
            kinds("para\n```rust\nfn f() {}\n```\nafter"),
            vec![Text, FenceOpen, FenceLine, FenceClose, Text]
        );
    }

    #[test]
    fn test_closing_fence_must_match() {
        use NodeKind::*;
        assert_eq!(
            kinds("````md\n```\n~~~~\n````"),
            vec![FenceOpen, FenceLine, FenceLine, FenceClose]
        );
        assert_eq!(
            kinds("~~~\n```\n~~~~~"),
            vec![FenceOpen, FenceLine, FenceClose]
        );
    }

    #[test]
    fn test_fence_with_info_is_not_a_close() {
        use NodeKind::*;
        assert_eq!(
            kinds("```js\n```py\n```"),
            vec![FenceOpen, FenceLine, FenceClose]
        );
    }

    #[test]
    fn test_unclosed_block_runs_to_end() {
        use NodeKind::*;
        assert_eq!(kinds("```sh\nls\npwd"), vec![FenceOpen, FenceLine, FenceLine]);
    }

    #[test]
    fn test_indentation_limits() {
        use NodeKind::*;
        assert_eq!(kinds("   ```sh\nx\n   ```"), vec![FenceOpen, FenceLine, FenceClose]);
        assert_eq!(kinds("    ```sh"), vec![Text]);
        assert_eq!(kinds("``sh"), vec![Text]);
    }

    #[test]
    fn test_spans_and_crlf() {
        let tree = FenceSyntaxTree::parse(&TextBuffer::new("ab\r\ncd"));
        let nodes: Vec<_> = tree.nodes(0, usize::MAX).collect();
        assert_eq!((nodes[0].from, nodes[0].to), (0, 2));
        assert_eq!((nodes[1].from, nodes[1].to), (4, 6));
    }

    #[test]
    fn test_nodes_bounded_by_range() {
        let tree = FenceSyntaxTree::parse(&TextBuffer::new("aa\nbb\ncc\ndd"));
        let indices: Vec<_> = tree.nodes(4, 7).map(|node| node.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn test_fence_in_blockquote() {
        use NodeKind::*;
        assert_eq!(
            kinds("> ```rs\n> a\n> ```\n\nafter"),
            vec![FenceOpen, FenceLine, FenceClose, Text, Text]
        );
    }

    #[test]
    fn test_fence_nested_in_list_item() {
        use NodeKind::*;
        assert_eq!(
            kinds("1. item\n\n    ```rs\n    a\n    b\n    ```\n"),
            vec![Text, Text, FenceOpen, FenceLine, FenceLine, FenceClose, Text]
        );
    }

    #[test]
    fn test_indented_code_is_text() {
        use NodeKind::*;
        assert_eq!(kinds("para\n\n    code\n"), vec![Text, Text, Text, Text]);
    }

    #[test]
    fn test_fence_run() {
        assert_eq!(fence_run("```js"), "```js");
        assert_eq!(fence_run("- ```js HL:\"1\""), "```js HL:\"1\"");
        assert_eq!(fence_run(">  > ~~~py"), "~~~py");
    }

    #[test]
    fn test_siblings() {
        let tree = FenceSyntaxTree::parse(&TextBuffer::new("a\nb"));
        let first = tree.nodes(0, 0).next().unwrap();
        let second = tree.next_sibling(&first).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(tree.prev_sibling(&second), Some(first));
        assert_eq!(tree.prev_sibling(&first), None);
        assert_eq!(tree.next_sibling(&second), None);
    }
}
