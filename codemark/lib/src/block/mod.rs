//! Code block occurrences and how they are found.
//!
//! A [`CodeBlockOccurrence`] is rebuilt from source text on every pass and
//! never cached. [`locate`] finds a rendered block's extent and fence line;
//! [`assemble`] turns that into the normalized record.

pub mod assemble;
pub mod locate;

pub use assemble::{
    assemble, assemble_fence, candidate_language, language_from_classes, line_count_from_text,
};
pub use locate::{BlockLocator, Fallback, LiveBufferLocator, LocatedBlock, RecoveredTextLocator};

use crate::dsl::AnnotationDirectives;
use crate::source::SectionInfo;
use serde::Serialize;

/// Line extent of a fenced block in its document, 0-based.
///
/// `start_line` is the fence-open line and `end_line` the fence-close line
/// (or the virtual line just past the end for an unclosed fence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceExtent {
    pub start_line: usize,
    pub end_line: usize,
}

impl SourceExtent {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Content lines strictly between the fences, or `None` for a degenerate
    /// extent.
    pub fn content_lines(&self) -> Option<usize> {
        (self.end_line > self.start_line).then(|| self.end_line - self.start_line - 1)
    }
}

impl From<SectionInfo> for SourceExtent {
    fn from(section: SectionInfo) -> Self {
        Self::new(section.line_start, section.line_end)
    }
}

/// One fenced block found in a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeBlockOccurrence {
    /// Language name as emitted by the host.
    pub language: String,
    /// Content lines strictly between the fence-open and fence-close lines.
    pub line_count: usize,
    pub directives: AnnotationDirectives,
    #[serde(rename = "sourceExtent")]
    pub extent: SourceExtent,
}
