//! Parser for fence-line directives.
//!
//! Parses fence-open lines like:
//! - ```` ```rust ````
//! - ```` ```ts TI:"Main" ````
//! - ```` ```js HL:"1,4-6" "FOLD" TI:"app.js" ````

use super::{AnnotationDirectives, LineMembershipSet, LineRange};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

lazy_static! {
    /// Up to three spaces of indentation, a backtick or tilde fence, then the
    /// language token.
    static ref FENCE_PATTERN: Regex = Regex::new(r"^ {0,3}(?:`{3,}|~{3,})[ \t]*([\w+#.-]+)").unwrap();

    /// `TI:"<title>"`; the title never spans a line or holds a double quote.
    static ref TITLE_PATTERN: Regex = Regex::new(r#"(?i)TI:"([^"\r\n]*)""#).unwrap();

    /// `HL:"<ranges>"`.
    static ref HIGHLIGHT_PATTERN: Regex = Regex::new(r#"(?i)HL:"([^"\r\n]*)""#).unwrap();

    /// Bare `"FOLD"` token.
    static ref FOLD_PATTERN: Regex = Regex::new(r#"(?i)"FOLD""#).unwrap();
}

/// Extracts the language token of a fence-open line.
///
/// ## Examples
///
/// ```
/// use codemark_lib::dsl::fence_language;
///
/// assert_eq!(fence_language("```python TI:\"x\""), Some("python"));
/// assert_eq!(fence_language("~~~rust"), Some("rust"));
/// assert_eq!(fence_language("```"), None);
/// assert_eq!(fence_language("plain text"), None);
/// ```
pub fn fence_language(line: &str) -> Option<&str> {
    FENCE_PATTERN
        .captures(first_line(line))
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

/// Parses a fence-open line into its directives.
///
/// Each directive is independent and optional; order in the line does not
/// matter. Only the first line of `line` is considered.
///
/// ## Examples
///
/// ```
/// use codemark_lib::dsl::parse_fence_line;
///
/// let meta = parse_fence_line(r#"```js "fold" hl:"2" ti:"app.js""#);
/// assert_eq!(meta.language, "js");
/// assert_eq!(meta.title, "app.js");
/// assert!(meta.highlight_lines.contains(2));
/// assert!(meta.collapsed);
///
/// let meta = parse_fence_line("```rust");
/// assert_eq!(meta.language, "rust");
/// assert!(meta.title.is_empty());
/// ```
pub fn parse_fence_line(line: &str) -> AnnotationDirectives {
    let line = first_line(line);

    let title = TITLE_PATTERN
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let (highlight_ranges, highlight_lines) = HIGHLIGHT_PATTERN
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|m| parse_line_ranges(m.as_str()))
        .unwrap_or_default();

    AnnotationDirectives {
        language: fence_language(line).unwrap_or_default().to_string(),
        title,
        highlight_ranges,
        highlight_lines,
        collapsed: FOLD_PATTERN.is_match(line),
    }
}

/// Expands an `HL` payload into its line membership.
///
/// Whitespace is stripped, the payload is split on commas, `N-M` contributes
/// every line from `N` up to `M` without materializing them, and a bare `N` contributes itself. A
/// reversed range contributes nothing. Tokens that are neither are recorded as
/// rejected.
///
/// ## Examples
///
/// ```
/// use codemark_lib::dsl::expand_line_ranges;
///
/// assert_eq!(expand_line_ranges("1-3,5").lines().collect::<Vec<_>>(), vec![1, 2, 3, 5]);
/// assert_eq!(expand_line_ranges("2-2").lines().collect::<Vec<_>>(), vec![2]);
/// assert!(expand_line_ranges("").is_empty());
/// assert!(expand_line_ranges("5-3").is_empty());
///
/// let wide = expand_line_ranges("10-1000000000");
/// assert!(wide.contains(999_999_999));
/// assert!(!wide.contains(9));
/// ```
pub fn expand_line_ranges(payload: &str) -> LineMembershipSet {
    parse_line_ranges(payload).1
}

/// Parses an `HL` payload into the written ranges and their expansion.
fn parse_line_ranges(payload: &str) -> (Vec<LineRange>, LineMembershipSet) {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let mut ranges = Vec::new();
    let mut membership = LineMembershipSet::new();

    for token in compact.split(',').filter(|token| !token.is_empty()) {
        match parse_token(token) {
            Some(range) => {
                if range.is_reversed() {
                    debug!(token, "Reversed highlight range contributes no lines");
                }
                membership.extend(&range);
                ranges.push(range);
            }
            None => {
                debug!(token, "Ignoring malformed highlight token");
                membership.reject(token);
            }
        }
    }

    (ranges, membership)
}

/// Reads `N` or `N-M`.
fn parse_token(token: &str) -> Option<LineRange> {
    match token.split_once('-') {
        Some((start, end)) => {
            let start = start.parse::<usize>().ok()?;
            let end = end.parse::<usize>().ok()?;
            Some(LineRange::new(start, end))
        }
        None => token.parse::<usize>().ok().map(LineRange::single),
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
