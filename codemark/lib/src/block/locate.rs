//! Finding a rendered block's source extent and fence-open line.
//!
//! Two strategies implement [`BlockLocator`]:
//!
//! - [`LiveBufferLocator`] resolves the node to a section of the buffer open
//!   for editing and reads the fence line straight from it.
//! - [`RecoveredTextLocator`] works from a file's text read back from storage
//!   plus the stored section index. It handles every block of the document in
//!   one batch, keyed by the block's position among the rendered code blocks.
//!
//! [`Fallback`] chains them so the live strategy is tried first.

use super::SourceExtent;
use crate::dom::{Document, NodeId};
use crate::source::{
    FileReader, LineSource, RecoveredText, SectionIndex, SectionInfo, SectionKind,
    SectionResolver, TextBuffer, index_sections,
};
use crate::types::CodemarkResult;
use std::path::Path;
use tracing::{debug, trace};

/// A block resolved against its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedBlock {
    pub extent: SourceExtent,
    /// Literal text of the fence-open line.
    pub fence_line: String,
    /// Text of each content line, as far as the source has it.
    pub lines: Vec<String>,
}

impl LocatedBlock {
    fn read(source: &impl LineSource, extent: SourceExtent) -> Option<Self> {
        let fence_line = source.line(extent.start_line)?.to_string();
        let lines = source.snapshot(
            extent.start_line + 1,
            extent.content_lines().unwrap_or_default(),
        );
        Some(Self {
            extent,
            fence_line,
            lines,
        })
    }
}

/// Resolves a rendered `<code>` node to its source.
///
/// `position` is the block's 0-based index among the code blocks of the
/// rendered fragment. Returning `None` leaves the block undecorated.
pub trait BlockLocator {
    fn locate(&self, doc: &Document, code: NodeId, position: usize) -> Option<LocatedBlock>;
}

/// Reads fence lines from the addressable buffer of the document being edited.
pub struct LiveBufferLocator<'a> {
    buffer: &'a TextBuffer,
    resolver: &'a dyn SectionResolver,
}

impl<'a> LiveBufferLocator<'a> {
    pub fn new(buffer: &'a TextBuffer, resolver: &'a dyn SectionResolver) -> Self {
        Self { buffer, resolver }
    }

    pub fn buffer(&self) -> &TextBuffer {
        self.buffer
    }
}

impl BlockLocator for LiveBufferLocator<'_> {
    fn locate(&self, doc: &Document, code: NodeId, _position: usize) -> Option<LocatedBlock> {
        let section = self
            .resolver
            .section_info(doc, code)
            .filter(|section| section.kind == SectionKind::Code)?;
        trace!(
            start = section.line_start,
            end = section.line_end,
            "Resolved block against live buffer"
        );
        LocatedBlock::read(self.buffer, section.into())
    }
}

/// Works from a whole file's text and its structural code sections.
#[derive(Debug, Clone, Default)]
pub struct RecoveredTextLocator {
    text: RecoveredText,
    sections: Vec<SectionInfo>,
}

impl RecoveredTextLocator {
    /// Builds a locator from file text and its section index. Non-code
    /// sections are dropped, so positions count code blocks only.
    pub fn new(text: &str, sections: impl IntoIterator<Item = SectionInfo>) -> Self {
        Self {
            text: RecoveredText::new(text),
            sections: sections
                .into_iter()
                .filter(|section| section.kind == SectionKind::Code)
                .collect(),
        }
    }

    /// Builds a locator from file text, indexing its code sections.
    pub fn from_text(text: &str) -> Self {
        Self::new(text, index_sections(text))
    }

    /// Reads `path` from `vault` and indexes the text that was read, so the
    /// fence lines and the section extents come from the same version of the
    /// file.
    ///
    /// ## Errors
    ///
    /// Returns an error if the vault cannot read the file.
    pub async fn recover<V: FileReader>(vault: &V, path: &Path) -> CodemarkResult<Self> {
        let text = vault.read_text(path).await?;
        let locator = Self::from_text(&text);
        debug!(
            path = %path.display(),
            code_sections = locator.sections.len(),
            "Recovered document text"
        );
        Ok(locator)
    }

    /// Reads `path` from `vault` and takes its code sections from the host's
    /// stored index instead of indexing the text.
    ///
    /// ## Errors
    ///
    /// Returns an error if the vault cannot read the file.
    pub async fn recover_indexed<V>(vault: &V, path: &Path) -> CodemarkResult<Self>
    where
        V: FileReader + SectionIndex,
    {
        let text = vault.read_text(path).await?;
        let sections = vault.code_sections(path);
        debug!(
            path = %path.display(),
            code_sections = sections.len(),
            "Recovered document text with stored index"
        );
        Ok(Self::new(&text, sections))
    }

    /// Code sections in document order.
    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    pub fn text(&self) -> &RecoveredText {
        &self.text
    }
}

impl BlockLocator for RecoveredTextLocator {
    fn locate(&self, _doc: &Document, _code: NodeId, position: usize) -> Option<LocatedBlock> {
        let Some(section) = self.sections.get(position) else {
            debug!(position, "No structural section for code block");
            return None;
        };
        LocatedBlock::read(&self.text, (*section).into())
    }
}

/// Tries `primary`, then `secondary`.
pub struct Fallback<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A: BlockLocator, B: BlockLocator> BlockLocator for Fallback<A, B> {
    fn locate(&self, doc: &Document, code: NodeId, position: usize) -> Option<LocatedBlock> {
        self.primary
            .locate(doc, code, position)
            .or_else(|| self.secondary.locate(doc, code, position))
    }
}

impl<L: BlockLocator + ?Sized> BlockLocator for &L {
    fn locate(&self, doc: &Document, code: NodeId, position: usize) -> Option<LocatedBlock> {
        (**self).locate(doc, code, position)
    }
}

impl<L: BlockLocator> BlockLocator for Option<L> {
    fn locate(&self, doc: &Document, code: NodeId, position: usize) -> Option<LocatedBlock> {
        self.as_ref()?.locate(doc, code, position)
    }
}
