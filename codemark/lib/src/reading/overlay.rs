//! Title bar, number column and highlight column of a rendered block.
//!
//! The overlays are siblings of the `<code>` element inside its `<pre>`. They
//! are owned by the `<pre>` and rebuilt from scratch on every injection: any
//! previous node with the same role is removed first, so re-processing a
//! block never duplicates them and never leaves rows of an old line count.

use crate::block::CodeBlockOccurrence;
use crate::config::Settings;
use crate::dom::{ClickAction, Document, NodeId};
use tracing::trace;

pub const TITLE_CLASS: &str = "codemark-title";
pub const TITLE_TEXT_CLASS: &str = "codemark-title-text";
pub const LANG_NAME_CLASS: &str = "codemark-lang-name";
pub const COLLAPSER_CLASS: &str = "codemark-collapser";
pub const HANDLE_CLASS: &str = "codemark-handle";
pub const LINENUM_WRAP_CLASS: &str = "codemark-linenum-wrap";
pub const LINENUM_CLASS: &str = "codemark-linenum";
pub const HIGHLIGHT_WRAP_CLASS: &str = "codemark-highlight-wrap";
pub const HIGHLIGHT_CLASS: &str = "codemark-highlight";
/// Added to the element wrapping the `<pre>`.
pub const WRAPPER_CLASS: &str = "codemark-wrap";
/// Added to a `<pre>` that carries a number column.
pub const HAS_LINENUM_CLASS: &str = "codemark-pre--has-linenum";
/// Style hook toggled by clicking the title bar.
pub const CLOSED_ATTRIBUTE: &str = "closed";
/// Room reserved above the code for the title bar.
pub const PADDING_TOP: &str = "35px";

/// Nodes created by one injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandles {
    pub pre: NodeId,
    pub code: NodeId,
    pub title: NodeId,
    pub numbers: Option<NodeId>,
    pub highlights: Option<NodeId>,
}

impl OverlayHandles {
    pub fn number_rows<'a>(&self, doc: &'a Document) -> &'a [NodeId] {
        self.numbers.map(|column| doc.children(column)).unwrap_or(&[])
    }

    pub fn highlight_rows<'a>(&self, doc: &'a Document) -> &'a [NodeId] {
        self.highlights
            .map(|column| doc.children(column))
            .unwrap_or(&[])
    }
}

/// Builds the overlays of one block inside `pre`.
pub fn inject_overlays(
    doc: &mut Document,
    pre: NodeId,
    code: NodeId,
    occurrence: &CodeBlockOccurrence,
    settings: &Settings,
) -> OverlayHandles {
    remove_overlays(doc, pre);

    doc.set_style_important(pre, "position", "relative");
    doc.set_style_important(pre, "padding-top", PADDING_TOP);
    if let Some(wrapper) = doc.parent(pre) {
        doc.add_class(wrapper, WRAPPER_CLASS);
    }

    let title = title_bar(doc, occurrence, settings);
    doc.prepend_child(pre, title);

    let numbers = settings.show_line_number.then(|| {
        let column = number_column(doc, occurrence.line_count, settings);
        doc.append_child(pre, column);
        doc.add_class(pre, HAS_LINENUM_CLASS);
        column
    });

    let highlights = (!occurrence.directives.highlight_lines.is_empty()).then(|| {
        let column = highlight_column(doc, occurrence, settings);
        doc.append_child(pre, column);
        column
    });

    trace!(
        language = %occurrence.language,
        rows = occurrence.line_count,
        numbers = numbers.is_some(),
        highlights = highlights.is_some(),
        "Injected overlays"
    );

    OverlayHandles {
        pre,
        code,
        title,
        numbers,
        highlights,
    }
}

/// Removes every overlay node, marker class and inline style from `pre`,
/// leaving the block as rendered.
pub fn remove_overlays(doc: &mut Document, pre: NodeId) {
    for class in [TITLE_CLASS, LINENUM_WRAP_CLASS, HIGHLIGHT_WRAP_CLASS] {
        for node in doc.children_with_class(pre, class) {
            doc.remove(node);
        }
    }
    doc.remove_class(pre, HAS_LINENUM_CLASS);
    doc.remove_style(pre, "position");
    doc.remove_style(pre, "padding-top");
    if let Some(wrapper) = doc.parent(pre) {
        doc.remove_class(wrapper, WRAPPER_CLASS);
    }
}

fn title_bar(doc: &mut Document, occurrence: &CodeBlockOccurrence, settings: &Settings) -> NodeId {
    let title = doc.create_element_with_class("div", TITLE_CLASS);

    let text = doc.create_element_with_class("span", TITLE_TEXT_CLASS);
    doc.set_text(text, &occurrence.directives.title);
    doc.append_child(title, text);

    if settings.show_lang_name_in_top_right {
        let lang = doc.create_element_with_class("span", LANG_NAME_CLASS);
        doc.set_text(lang, &capitalize(&occurrence.language));
        doc.append_child(title, lang);
    }

    let collapser = doc.create_element_with_class("div", COLLAPSER_CLASS);
    let handle = doc.create_element_with_class("div", HANDLE_CLASS);
    doc.append_child(collapser, handle);
    doc.append_child(title, collapser);

    if occurrence.directives.collapsed {
        doc.set_attribute(title, CLOSED_ATTRIBUTE, "");
    }
    if let Some(color) = settings.title_font() {
        doc.set_style_important(title, "color", color);
    }
    doc.set_style(title, "background-color", settings.title_background());
    doc.set_on_click(title, ClickAction::ToggleAttribute(CLOSED_ATTRIBUTE.to_string()));

    title
}

fn number_column(doc: &mut Document, rows: usize, settings: &Settings) -> NodeId {
    let column = doc.create_element_with_class("span", LINENUM_WRAP_CLASS);
    doc.set_style(column, "top", PADDING_TOP);
    if settings.show_dividing_line {
        doc.set_style(column, "border-right", "1px currentColor solid");
    }
    for number in 1..=rows {
        let row = doc.create_element_with_class("span", LINENUM_CLASS);
        doc.set_text(row, &number.to_string());
        doc.append_child(column, row);
    }
    column
}

fn highlight_column(
    doc: &mut Document,
    occurrence: &CodeBlockOccurrence,
    settings: &Settings,
) -> NodeId {
    let column = doc.create_element_with_class("span", HIGHLIGHT_WRAP_CLASS);
    doc.set_style(column, "top", PADDING_TOP);
    for number in 1..=occurrence.line_count {
        let row = doc.create_element_with_class("span", HIGHLIGHT_CLASS);
        let background = if occurrence.directives.highlight_lines.contains(number) {
            settings.highlight_color.as_str()
        } else {
            "transparent"
        };
        doc.set_style(row, "background-color", background);
        doc.append_child(column, row);
    }
    column
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::SourceExtent;
    use crate::dsl::parse_fence_line;

    fn occurrence(fence: &str, line_count: usize) -> CodeBlockOccurrence {
        let directives = parse_fence_line(fence);
        CodeBlockOccurrence {
            language: directives.language.clone(),
            line_count,
            directives,
            extent: SourceExtent::new(0, line_count + 1),
        }
    }

    fn block(doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let wrapper = doc.create_element("div");
        let pre = doc.create_element("pre");
        let code = doc.create_element_with_class("code", "language-python");
        doc.append_child(wrapper, pre);
        doc.append_child(pre, code);
        (wrapper, pre, code)
    }

    #[test]
    fn test_demo_block_overlays() {
        let mut doc = Document::new();
        let (wrapper, pre, code) = block(&mut doc);
        let occ = occurrence(r#"```python TI:"demo.py" HL:"1-2,4""#, 5);
        let handles = inject_overlays(&mut doc, pre, code, &occ, &Settings::default());

        assert_eq!(doc.children(pre)[0], handles.title);
        let title_text = doc.find_by_class(handles.title, TITLE_TEXT_CLASS)[0];
        assert_eq!(doc.text_content(title_text), "demo.py");
        let lang = doc.find_by_class(handles.title, LANG_NAME_CLASS)[0];
        assert_eq!(doc.text_content(lang), "Python");

        assert_eq!(handles.number_rows(&doc).len(), 5);
        let shaded: Vec<bool> = handles
            .highlight_rows(&doc)
            .iter()
            .map(|row| doc.style(*row, "background-color") == Some("#2d82cc20"))
            .collect();
        assert_eq!(shaded, vec![true, true, false, true, false]);
        assert_eq!(
            doc.style(handles.highlight_rows(&doc)[2], "background-color"),
            Some("transparent")
        );

        assert!(doc.has_class(wrapper, WRAPPER_CLASS));
        assert!(doc.has_class(pre, HAS_LINENUM_CLASS));
        assert_eq!(doc.style(pre, "padding-top"), Some(PADDING_TOP));
    }

    #[test]
    fn test_injection_is_idempotent() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        let occ = occurrence(r#"```python HL:"2""#, 3);
        let first = inject_overlays(&mut doc, pre, code, &occ, &Settings::default());
        let second = inject_overlays(&mut doc, pre, code, &occ, &Settings::default());

        assert_eq!(doc.children_with_class(pre, TITLE_CLASS).len(), 1);
        assert_eq!(doc.children_with_class(pre, LINENUM_WRAP_CLASS).len(), 1);
        assert_eq!(doc.children_with_class(pre, HIGHLIGHT_WRAP_CLASS).len(), 1);
        assert!(!doc.contains(first.title));
        assert!(doc.contains(second.title));
        // Title, code, numbers, highlights.
        assert_eq!(doc.children(pre).len(), 4);
    }

    #[test]
    fn test_reinjection_with_new_line_count() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        inject_overlays(&mut doc, pre, code, &occurrence("```python", 8), &Settings::default());
        let handles =
            inject_overlays(&mut doc, pre, code, &occurrence("```python", 2), &Settings::default());
        assert_eq!(handles.number_rows(&doc).len(), 2);
        assert_eq!(doc.find_by_class(pre, LINENUM_CLASS).len(), 2);
    }

    #[test]
    fn test_no_highlight_column_without_highlights() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        let handles =
            inject_overlays(&mut doc, pre, code, &occurrence("```python", 3), &Settings::default());
        assert!(handles.highlights.is_none());
        assert!(handles.highlight_rows(&doc).is_empty());
    }

    #[test]
    fn test_settings_shape_overlays() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        let settings = Settings {
            show_line_number: false,
            show_lang_name_in_top_right: false,
            title_font_color: Some("white".to_string()),
            title_background_color: String::new(),
            ..Default::default()
        };
        let handles = inject_overlays(
            &mut doc,
            pre,
            code,
            &occurrence(r#"```python "FOLD""#, 3),
            &settings,
        );
        assert!(handles.numbers.is_none());
        assert!(!doc.has_class(pre, HAS_LINENUM_CLASS));
        assert!(doc.find_by_class(handles.title, LANG_NAME_CLASS).is_empty());
        assert_eq!(doc.style(handles.title, "color"), Some("white"));
        assert_eq!(doc.style(handles.title, "background-color"), Some("#00000020"));
        assert!(doc.has_attribute(handles.title, CLOSED_ATTRIBUTE));
    }

    #[test]
    fn test_dividing_line_on_number_column() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        let settings = Settings {
            show_dividing_line: true,
            ..Default::default()
        };
        let handles = inject_overlays(&mut doc, pre, code, &occurrence("```python", 1), &settings);
        let column = handles.numbers.unwrap();
        assert_eq!(doc.style(column, "border-right"), Some("1px currentColor solid"));
        assert_eq!(doc.style(column, "top"), Some("35px"));
    }

    #[test]
    fn test_title_click_toggles_closed() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        let handles =
            inject_overlays(&mut doc, pre, code, &occurrence("```python", 1), &Settings::default());
        assert!(!doc.has_attribute(handles.title, CLOSED_ATTRIBUTE));
        assert!(doc.click(handles.title));
        assert!(doc.has_attribute(handles.title, CLOSED_ATTRIBUTE));
        assert!(doc.click(handles.title));
        assert!(!doc.has_attribute(handles.title, CLOSED_ATTRIBUTE));
    }

    #[test]
    fn test_remove_overlays() {
        let mut doc = Document::new();
        let (_, pre, code) = block(&mut doc);
        inject_overlays(&mut doc, pre, code, &occurrence(r#"```python HL:"1""#, 2), &Settings::default());
        remove_overlays(&mut doc, pre);
        assert_eq!(doc.children(pre), &[code]);
        assert!(!doc.has_class(pre, HAS_LINENUM_CLASS));
        assert_eq!(doc.style(pre, "padding-top"), None);
        assert_eq!(doc.style(pre, "position"), None);
        let wrapper = doc.parent(pre).unwrap();
        assert!(!doc.has_class(wrapper, WRAPPER_CLASS));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("python"), "Python");
        assert_eq!(capitalize("c++"), "C++");
        assert_eq!(capitalize(""), "");
    }
}
