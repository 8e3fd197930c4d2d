//! Combining a located block with its parsed directives.

use super::{CodeBlockOccurrence, LocatedBlock, SourceExtent};
use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::dsl::{fence_language, parse_fence_line};
use tracing::debug;

const LANGUAGE_CLASS_PREFIX: &str = "language-";

/// First `language-<name>` token of a class list.
///
/// ## Examples
///
/// ```
/// use codemark_lib::block::language_from_classes;
///
/// let classes = vec!["hljs".to_string(), "language-python".to_string()];
/// assert_eq!(language_from_classes(&classes), Some("python"));
/// assert_eq!(language_from_classes(&["language-".to_string()]), None);
/// ```
pub fn language_from_classes(classes: &[String]) -> Option<&str> {
    classes
        .iter()
        .filter_map(|class| class.strip_prefix(LANGUAGE_CLASS_PREFIX))
        .find(|language| !language.is_empty())
}

/// Language of a rendered `<code>` element, unless it is missing or excluded.
///
/// This runs before any parsing; `None` means the block must be left alone.
pub fn candidate_language(doc: &Document, code: NodeId, settings: &Settings) -> Option<String> {
    let Some(language) = language_from_classes(doc.classes(code)) else {
        debug!("Skipping code block without a language class");
        return None;
    };
    if settings.is_excluded(language) {
        debug!(language, "Skipping excluded language");
        return None;
    }
    Some(language.to_string())
}

/// Content line count of a block's raw text: one less than the number of
/// `\n`-separated pieces.
///
/// ```
/// use codemark_lib::block::line_count_from_text;
///
/// assert_eq!(line_count_from_text("a\nb\nc\n"), 3);
/// assert_eq!(line_count_from_text(""), 0);
/// ```
pub fn line_count_from_text(text: &str) -> usize {
    text.split('\n').count().saturating_sub(1)
}

/// Builds the occurrence record of a rendered block.
///
/// `language` comes from [`candidate_language`]. The structural line count is
/// used when the extent is usable, the code element's text otherwise.
pub fn assemble(
    doc: &Document,
    code: NodeId,
    language: String,
    located: &LocatedBlock,
    settings: &Settings,
) -> CodeBlockOccurrence {
    let mut directives = parse_fence_line(&located.fence_line);
    directives.title = settings.substitute_spaces(&directives.title);

    let line_count = located
        .extent
        .content_lines()
        .unwrap_or_else(|| line_count_from_text(&doc.text_content(code)));

    CodeBlockOccurrence {
        language,
        line_count,
        directives,
        extent: located.extent,
    }
}

/// Builds the occurrence record straight from a fence-open line, for contexts
/// without a rendered element.
///
/// The fence tag is lower-cased the way the renderer lower-cases its
/// `language-*` class. Returns `None` when the fence names no language or the
/// language is excluded.
pub fn assemble_fence(
    fence_line: &str,
    extent: SourceExtent,
    settings: &Settings,
) -> Option<CodeBlockOccurrence> {
    let language = fence_language(fence_line)?.to_lowercase();
    if settings.is_excluded(&language) {
        debug!(%language, "Skipping excluded language");
        return None;
    }

    let mut directives = parse_fence_line(fence_line);
    directives.title = settings.substitute_spaces(&directives.title);

    Some(CodeBlockOccurrence {
        language,
        line_count: extent.content_lines().unwrap_or_default(),
        directives,
        extent,
    })
}
