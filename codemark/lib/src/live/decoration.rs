//! Declarative decorations for the editor view.

use crate::dom::{Document, NodeId};
use std::ops::Range;

/// Class of the line-number gutter widget.
pub const LINE_NUMBER_CLASS: &str = "codemark-line-num";

/// Line class marking a line that shows a number widget.
pub const LINE_SHOW_CLASS: &str = "codemark-line-show";

/// Styling attached to a whole line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineDecoration {
    pub class: Option<String>,
    pub attributes: Vec<(String, String)>,
}

impl LineDecoration {
    pub fn with_class(class: &str) -> Self {
        Self {
            class: Some(class.to_string()),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(name: &str, value: &str) -> Self {
        Self {
            class: None,
            attributes: vec![(name.to_string(), value.to_string())],
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Inline widget showing a 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineNumberWidget {
    pub number: usize,
    pub dividing_line: bool,
}

impl LineNumberWidget {
    /// Renders the widget as a detached `<span>`.
    pub fn to_dom(&self, doc: &mut Document) -> NodeId {
        let span = doc.create_element_with_class("span", LINE_NUMBER_CLASS);
        doc.set_text(span, &self.number.to_string());
        if self.dividing_line {
            doc.set_style(span, "border-right", "1px currentColor solid");
        }
        span
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoration {
    Line(LineDecoration),
    Widget(LineNumberWidget),
}

/// A decoration bound to a buffer span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationRange {
    pub from: usize,
    pub to: usize,
    pub decoration: Decoration,
}

/// Collects decorations for one rebuild.
#[derive(Debug, Default)]
pub struct DecorationSetBuilder {
    ranges: Vec<DecorationRange>,
}

impl DecorationSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, from: usize, to: usize, decoration: Decoration) {
        self.ranges.push(DecorationRange {
            from,
            to,
            decoration,
        });
    }

    /// Orders by position; decorations at the same position keep the order
    /// they were added in.
    pub fn finish(mut self) -> DecorationSet {
        self.ranges.sort_by_key(|range| (range.from, range.to));
        DecorationSet {
            ranges: self.ranges,
        }
    }
}

/// An immutable, position-ordered set of decorations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecorationSet {
    ranges: Vec<DecorationRange>,
}

impl DecorationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecorationRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Decorations starting inside `range`.
    pub fn between(&self, range: Range<usize>) -> impl Iterator<Item = &DecorationRange> {
        self.ranges
            .iter()
            .filter(move |decoration| range.contains(&decoration.from))
    }

    /// Line-number widgets, in position order.
    pub fn widgets(&self) -> impl Iterator<Item = (usize, &LineNumberWidget)> {
        self.ranges.iter().filter_map(|range| match &range.decoration {
            Decoration::Widget(widget) => Some((range.from, widget)),
            Decoration::Line(_) => None,
        })
    }

    /// Line decorations, in position order.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &LineDecoration)> {
        self.ranges.iter().filter_map(|range| match &range.decoration {
            Decoration::Line(line) => Some((range.from, line)),
            Decoration::Widget(_) => None,
        })
    }
}
