//! Live-preview decorations for a document open for editing.
//!
//! [`LivePreviewPlugin`] keeps one [`DecorationSet`] per editor view and
//! rebuilds it wholesale whenever the document changes, the viewport moves, or
//! a [`StateEffect::Reset`] arrives. There is no incremental patching; a
//! rebuild replaces the previous set entirely.
//!
//! ## Examples
//!
//! ```
//! use codemark_lib::Settings;
//! use codemark_lib::live::{EditorView, LivePreviewPlugin};
//!
//! let mut view = EditorView::new("```rust HL:\"2\"\nfn a() {}\nfn b() {}\n```\n");
//! let mut plugin = LivePreviewPlugin::new(&view, Settings::default());
//! assert_eq!(plugin.decorations().widgets().count(), 2);
//!
//! let update = view.apply_edit(0..0, "intro\n\n");
//! assert!(plugin.update(&view, &update));
//! let (first_widget, _) = plugin.decorations().widgets().next().unwrap();
//! assert_eq!(first_widget, view.buffer().line_start(3).unwrap());
//! ```

pub mod decoration;
pub mod syntax;

pub use decoration::{
    Decoration, DecorationRange, DecorationSet, DecorationSetBuilder, LINE_NUMBER_CLASS,
    LINE_SHOW_CLASS, LineDecoration, LineNumberWidget,
};
pub use syntax::{FenceSyntaxTree, NodeKind, SyntaxNode, SyntaxTree};

use crate::block::{SourceExtent, assemble_fence};
use crate::config::Settings;
use crate::source::{LineSource, TextBuffer};
use std::ops::Range;
use tracing::{debug, instrument, trace};

/// Effects carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEffect {
    /// Forces every decoration set to rebuild (e.g. after a settings change).
    Reset,
    /// An effect owned by some other extension.
    Custom(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    pub effects: Vec<StateEffect>,
}

/// What changed in one view update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    pub doc_changed: bool,
    pub viewport_changed: bool,
    pub transactions: Vec<Transaction>,
}

impl ViewUpdate {
    /// Whether any transaction carries `effect`.
    pub fn has_effect(&self, effect: &StateEffect) -> bool {
        self.transactions
            .iter()
            .any(|transaction| transaction.effects.contains(effect))
    }
}

/// An editor view: a buffer, its syntax nodes, and the visible byte range.
#[derive(Debug, Clone)]
pub struct EditorView {
    buffer: TextBuffer,
    tree: FenceSyntaxTree,
    viewport: Range<usize>,
}

impl EditorView {
    /// A view over `text` with the whole document visible.
    pub fn new(text: impl Into<String>) -> Self {
        let buffer = TextBuffer::new(text);
        let tree = FenceSyntaxTree::parse(&buffer);
        let viewport = 0..buffer.len();
        Self {
            buffer,
            tree,
            viewport,
        }
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn syntax_tree(&self) -> &FenceSyntaxTree {
        &self.tree
    }

    pub fn viewport(&self) -> Range<usize> {
        self.viewport.clone()
    }

    /// Moves the visible range (clamped to the buffer).
    pub fn set_viewport(&mut self, viewport: Range<usize>) -> ViewUpdate {
        let clamped = self.clamp(viewport);
        let viewport_changed = clamped != self.viewport;
        self.viewport = clamped;
        ViewUpdate {
            viewport_changed,
            ..Default::default()
        }
    }

    /// Replaces `range` with `insert`. A viewport reaching the old end of the
    /// document keeps reaching the new end.
    pub fn apply_edit(&mut self, range: Range<usize>, insert: &str) -> ViewUpdate {
        let reached_end = self.viewport.end >= self.buffer.len();
        self.buffer.replace(range, insert);
        self.tree = FenceSyntaxTree::parse(&self.buffer);

        let mut viewport = self.viewport.clone();
        if reached_end {
            viewport.end = self.buffer.len();
        }
        let viewport = self.clamp(viewport);
        let viewport_changed = viewport != self.viewport;
        self.viewport = viewport;

        ViewUpdate {
            doc_changed: true,
            viewport_changed,
            transactions: vec![Transaction::default()],
        }
    }

    /// Dispatches a transaction carrying only `effects`.
    pub fn dispatch(&mut self, effects: Vec<StateEffect>) -> ViewUpdate {
        ViewUpdate {
            transactions: vec![Transaction { effects }],
            ..Default::default()
        }
    }

    fn clamp(&self, viewport: Range<usize>) -> Range<usize> {
        let end = viewport.end.min(self.buffer.len());
        viewport.start.min(end)..end
    }
}

/// Owns the decoration set of one editor view.
#[derive(Debug, Clone)]
pub struct LivePreviewPlugin {
    settings: Settings,
    decorations: DecorationSet,
}

impl LivePreviewPlugin {
    pub fn new(view: &EditorView, settings: Settings) -> Self {
        let decorations = build_decorations(
            view.syntax_tree(),
            view.buffer(),
            view.viewport(),
            &settings,
        );
        Self {
            settings,
            decorations,
        }
    }

    /// Rebuilds the decorations if the update calls for it. Returns whether a
    /// rebuild happened.
    pub fn update(&mut self, view: &EditorView, update: &ViewUpdate) -> bool {
        let reset = update.has_effect(&StateEffect::Reset);
        if !(update.doc_changed || update.viewport_changed || reset) {
            return false;
        }
        self.decorations = build_decorations(
            view.syntax_tree(),
            view.buffer(),
            view.viewport(),
            &self.settings,
        );
        true
    }

    pub fn decorations(&self) -> &DecorationSet {
        &self.decorations
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Swaps the settings. They apply at the next rebuild, which the host
    /// forces by dispatching [`StateEffect::Reset`].
    pub fn reconfigure(&mut self, settings: Settings) {
        self.settings = settings;
    }
}

/// Builds the decorations of every code block visible in `viewport`.
///
/// Scans the visible nodes; each fence-open node starts a block whose content
/// lines are walked through sibling links until the fence-close node or the
/// end of the siblings. When the viewport starts inside a block, the walk
/// begins at that block's fence-open node so visible lines keep their
/// numbering. Only lines overlapping the viewport get decorations.
#[instrument(skip_all, fields(from = viewport.start, to = viewport.end))]
pub fn build_decorations<T: SyntaxTree>(
    tree: &T,
    buffer: &TextBuffer,
    viewport: Range<usize>,
    settings: &Settings,
) -> DecorationSet {
    let mut builder = DecorationSetBuilder::new();
    let mut resume_at = 0;
    let mut first = true;

    for node in tree.nodes(viewport.start, viewport.end) {
        let entered_mid_block = first && node.kind == NodeKind::FenceLine;
        first = false;
        if node.index < resume_at {
            continue;
        }
        let head = match node.kind {
            NodeKind::FenceOpen => Some(node),
            NodeKind::FenceLine if entered_mid_block => fence_open_before(tree, node),
            _ => None,
        };
        if let Some(head) = head {
            resume_at = render_block(&mut builder, tree, buffer, head, &viewport, settings);
        }
    }

    let decorations = builder.finish();
    debug!(decorations = decorations.len(), "Rebuilt live decorations");
    decorations
}

fn fence_open_before<T: SyntaxTree>(tree: &T, node: SyntaxNode) -> Option<SyntaxNode> {
    let mut current = tree.prev_sibling(&node);
    while let Some(candidate) = current {
        match candidate.kind {
            NodeKind::FenceOpen => return Some(candidate),
            NodeKind::FenceLine => current = tree.prev_sibling(&candidate),
            NodeKind::FenceClose | NodeKind::Text => return None,
        }
    }
    None
}

/// Decorates one block. Returns the index of the first node after it.
fn render_block<T: SyntaxTree>(
    builder: &mut DecorationSetBuilder,
    tree: &T,
    buffer: &TextBuffer,
    head: SyntaxNode,
    viewport: &Range<usize>,
    settings: &Settings,
) -> usize {
    let mut content = Vec::new();
    let mut end_line = None;
    let mut next = tree.next_sibling(&head);
    while let Some(node) = next {
        if node.kind != NodeKind::FenceLine {
            if node.kind == NodeKind::FenceClose {
                end_line = Some(node.index);
            }
            break;
        }
        content.push(node);
        next = tree.next_sibling(&node);
    }
    let end_line = end_line.unwrap_or(head.index + content.len() + 1);

    let Some(fence_line) = buffer.line(head.index) else {
        return end_line + 1;
    };
    let extent = SourceExtent::new(head.index, end_line);
    let Some(occurrence) = assemble_fence(syntax::fence_run(fence_line), extent, settings) else {
        return end_line + 1;
    };
    trace!(
        language = %occurrence.language,
        start = head.index,
        end = end_line,
        "Decorating code block"
    );

    let highlight = format!("background-color: {}", settings.highlight_color);
    for (index, node) in content.iter().enumerate() {
        if node.to < viewport.start {
            continue;
        }
        if node.from > viewport.end {
            break;
        }
        let number = index + 1;
        let at = buffer.line_at(node.from).from;

        if occurrence.directives.highlight_lines.contains(number) {
            builder.add(
                at,
                at,
                Decoration::Line(LineDecoration::with_attribute("style", &highlight)),
            );
        }
        if settings.show_line_number {
            builder.add(at, at, Decoration::Line(LineDecoration::with_class(LINE_SHOW_CLASS)));
            builder.add(
                at,
                at,
                Decoration::Widget(LineNumberWidget {
                    number,
                    dividing_line: settings.show_dividing_line,
                }),
            );
        }
    }

    end_line + 1
}
