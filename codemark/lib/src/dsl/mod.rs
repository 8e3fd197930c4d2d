//! Fence-line directive grammar.
//!
//! A code block's opening fence line carries its language tag and up to three
//! independent, order-free directives:
//!
//! ````markdown
//! ```ts TI:"Greeter" HL:"1,4-6" "FOLD"
//! const x = 1;
//! ```
//! ````
//!
//! - `TI:"…"` sets the title
//! - `HL:"…"` lists lines to highlight (`N` or `N-M`, comma separated)
//! - `"FOLD"` starts the block collapsed
//!
//! Markers are case-insensitive. Parsing never fails: a directive that does not
//! match its pattern is simply absent.

mod parser;

pub use parser::{expand_line_ranges, fence_language, parse_fence_line};

/// Directives parsed from one fence-open line.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationDirectives {
    /// Language token following the fence. Empty means "not a candidate".
    pub language: String,
    /// Title from `TI:"…"`, empty when absent.
    pub title: String,
    /// Ranges from `HL:"…"`, in the order written.
    pub highlight_ranges: Vec<LineRange>,
    /// Expanded membership of `highlight_ranges`.
    pub highlight_lines: LineMembershipSet,
    /// Whether `"FOLD"` was present.
    pub collapsed: bool,
}

impl AnnotationDirectives {
    /// A block is only decorated when its fence names a language.
    pub fn is_candidate(&self) -> bool {
        !self.language.is_empty()
    }
}

/// An inclusive, 1-based line range as written in an `HL` payload.
///
/// Reversed bounds (`5-3`) are kept as written and expand to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// Creates a single-line range.
    pub fn single(line: usize) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Creates a range from start to end (inclusive).
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Returns the start of the range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the end of the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// Whether the bounds were written high-to-low.
    pub fn is_reversed(&self) -> bool {
        self.start > self.end
    }

    /// Iterates the lines in ascending order; empty when reversed.
    pub fn lines(&self) -> impl Iterator<Item = usize> {
        self.start..=self.end
    }

    /// Whether `line` falls inside the bounds.
    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// Number of lines covered, saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        if self.is_reversed() {
            0
        } else {
            (self.end - self.start).saturating_add(1)
        }
    }

    /// Whether the range covers no line.
    pub fn is_empty(&self) -> bool {
        self.is_reversed()
    }
}

/// 1-based line indices to highlight.
///
/// Membership is answered from the written ranges, so an `HL` bound of any
/// size costs nothing to hold. Iteration yields every contribution in order,
/// duplicates included. Tokens that could not be read as a number or a range
/// are kept in [`rejected`](Self::rejected).
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct LineMembershipSet {
    ranges: Vec<LineRange>,
    rejected: Vec<String>,
}

impl LineMembershipSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from explicit line indices.
    pub fn from_lines(lines: impl IntoIterator<Item = usize>) -> Self {
        Self {
            ranges: lines.into_iter().map(LineRange::single).collect(),
            rejected: Vec::new(),
        }
    }

    /// Checks whether a 1-based line index is highlighted.
    pub fn contains(&self, line: usize) -> bool {
        self.ranges.iter().any(|range| range.contains(line))
    }

    /// Number of contributions (duplicates counted), saturating at `usize::MAX`.
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .fold(0usize, |total, range| total.saturating_add(range.len()))
    }

    /// Whether nothing is highlighted.
    pub fn is_empty(&self) -> bool {
        self.ranges.iter().all(LineRange::is_empty)
    }

    /// Contributions in the order they were written, expanded lazily.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.ranges.iter().flat_map(LineRange::lines)
    }

    /// The ranges backing this set, reversed ones included.
    pub fn ranges(&self) -> &[LineRange] {
        &self.ranges
    }

    /// Tokens that contributed nothing because they were malformed.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub(crate) fn extend(&mut self, range: &LineRange) {
        self.ranges.push(*range);
    }

    pub(crate) fn reject(&mut self, token: &str) {
        self.rejected.push(token.to_string());
    }
}
