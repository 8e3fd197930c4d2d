//! Static rendering of a markdown document into a [`Document`].
//!
//! Code blocks become `div.el-pre > pre > code.language-<tag>` fragments, the
//! shape a host emits for its reading view. Everything else is rendered by
//! pulldown-cmark's HTML writer and kept as raw nodes between them.

use crate::dom::{Document, NodeId};
use crate::source::sections::markdown_options;
use pulldown_cmark::{CodeBlockKind, Event, Parser, Tag, TagEnd, html};

/// Class of the root element returned by [`render_markdown`].
pub const DOCUMENT_CLASS: &str = "codemark-document";

/// Class of the element wrapping each `<pre>`.
pub const PRE_WRAPPER_CLASS: &str = "el-pre";

/// Renders `text` and returns the detached root element.
///
/// ## Examples
///
/// ```
/// use codemark_lib::dom::Document;
/// use codemark_lib::reading::render_markdown;
///
/// let mut doc = Document::new();
/// let root = render_markdown(&mut doc, "# Notes\n\n```Rust TI:\"x\"\nlet a = 1;\n```\n");
/// let blocks = doc.code_blocks(root);
/// assert_eq!(blocks.len(), 1);
/// let (_, code) = blocks[0];
/// assert!(doc.has_class(code, "language-rust"));
/// assert_eq!(doc.text_content(code), "let a = 1;\n");
/// ```
pub fn render_markdown(doc: &mut Document, text: &str) -> NodeId {
    let root = doc.create_element_with_class("div", DOCUMENT_CLASS);
    let mut prose: Vec<Event<'_>> = Vec::new();
    let mut code: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(text, markdown_options()) {
        if let Some((_, body)) = code.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, body)) = code.take() {
                        append_code_block(doc, root, language.as_deref(), &body);
                    }
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                flush_prose(doc, root, &mut prose);
                code = Some((language_tag(&kind), String::new()));
            }
            other => prose.push(other),
        }
    }

    flush_prose(doc, root, &mut prose);
    root
}

/// Lower-cased first word of a fenced block's info string.
fn language_tag(kind: &CodeBlockKind<'_>) -> Option<String> {
    match kind {
        CodeBlockKind::Fenced(info) => info
            .split_whitespace()
            .next()
            .map(|tag| tag.to_lowercase()),
        CodeBlockKind::Indented => None,
    }
}

fn append_code_block(doc: &mut Document, root: NodeId, language: Option<&str>, body: &str) {
    let wrapper = doc.create_element_with_class("div", PRE_WRAPPER_CLASS);
    let pre = doc.create_element("pre");
    let code = doc.create_element("code");
    if let Some(language) = language {
        doc.add_class(code, &format!("language-{}", language));
    }
    doc.set_text(code, body);
    doc.append_child(pre, code);
    doc.append_child(wrapper, pre);
    doc.append_child(root, wrapper);
}

fn flush_prose(doc: &mut Document, root: NodeId, prose: &mut Vec<Event<'_>>) {
    if prose.is_empty() {
        return;
    }
    let mut output = String::new();
    html::push_html(&mut output, prose.drain(..));
    let raw = doc.create_raw(&output);
    doc.append_child(root, raw);
}
