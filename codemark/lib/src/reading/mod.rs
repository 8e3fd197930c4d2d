//! Reading-view post-processing.
//!
//! [`ReadingView`] owns a rendered [`Document`] and decorates the code blocks
//! under a given root: locate each block's source, assemble its occurrence,
//! inject the overlays, then schedule a height reconciliation. Blocks that
//! cannot be located, have no language, or are excluded are left exactly as
//! rendered.
//!
//! ## Examples
//!
//! ```
//! use codemark_lib::Settings;
//! use codemark_lib::block::RecoveredTextLocator;
//! use codemark_lib::dom::Document;
//! use codemark_lib::reading::{MonospaceProbe, ReadingView, render_markdown};
//! use codemark_lib::source::index_sections;
//!
//! let text = "```python TI:\"demo.py\" HL:\"1-2,4\"\na\nb\nc\nd\ne\n```\n";
//! let mut doc = Document::new();
//! let root = render_markdown(&mut doc, text);
//!
//! let view = ReadingView::new(doc, Settings::default(), MonospaceProbe::default());
//! let locator = RecoveredTextLocator::new(text, index_sections(text));
//! let occurrences = view.process_with(root, &locator);
//!
//! assert_eq!(occurrences.len(), 1);
//! assert_eq!(occurrences[0].line_count, 5);
//! assert!(view.with_document(|doc| doc.to_html(root)).contains("demo.py"));
//! ```

pub mod overlay;
pub mod reconcile;
pub mod render;

pub use overlay::{OverlayHandles, inject_overlays, remove_overlays};
pub use reconcile::{
    DEFAULT_RECONCILE_DELAY, HeightProbe, MonospaceProbe, ReconcileScheduler, TrackedBlock,
    reconcile_block,
};
pub use render::render_markdown;

use crate::block::{
    BlockLocator, CodeBlockOccurrence, Fallback, LiveBufferLocator, RecoveredTextLocator,
    assemble, candidate_language,
};
use crate::config::Settings;
use crate::dom::{Document, NodeId};
use crate::source::FileReader;
use crate::types::CodemarkResult;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

type SharedProbe = Arc<dyn HeightProbe + Send + Sync>;

/// A rendered document whose code blocks carry overlays.
pub struct ReadingView {
    document: Arc<Mutex<Document>>,
    blocks: Arc<Mutex<Vec<TrackedBlock>>>,
    probe: SharedProbe,
    scheduler: ReconcileScheduler,
    settings: Settings,
}

impl ReadingView {
    pub fn new<P>(document: Document, settings: Settings, probe: P) -> Self
    where
        P: HeightProbe + Send + Sync + 'static,
    {
        Self {
            document: Arc::new(Mutex::new(document)),
            blocks: Arc::new(Mutex::new(Vec::new())),
            probe: Arc::new(probe),
            scheduler: ReconcileScheduler::default(),
            settings,
        }
    }

    /// Uses `delay` before each deferred reconciliation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.scheduler = ReconcileScheduler::new(delay);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs `f` with exclusive access to the document.
    pub fn with_document<R>(&self, f: impl FnOnce(&mut Document) -> R) -> R {
        f(&mut lock(&self.document))
    }

    /// Overlay handles of every tracked block.
    pub fn overlays(&self) -> Vec<OverlayHandles> {
        lock(&self.blocks)
            .iter()
            .map(|block| block.overlays)
            .collect()
    }

    /// Decorates every code block under `root` using `locator`, then
    /// schedules a reconciliation. Returns the decorated occurrences.
    #[instrument(skip_all)]
    pub fn process_with<L: BlockLocator>(
        &self,
        root: NodeId,
        locator: &L,
    ) -> Vec<CodeBlockOccurrence> {
        let mut occurrences = Vec::new();
        {
            let mut doc = lock(&self.document);
            let mut blocks = lock(&self.blocks);

            for (position, (pre, code)) in doc.code_blocks(root).into_iter().enumerate() {
                let Some(language) = candidate_language(&doc, code, &self.settings) else {
                    forget_block(&mut doc, &mut blocks, pre, code);
                    continue;
                };
                let Some(located) = locator.locate(&doc, code, position) else {
                    debug!(position, %language, "Leaving unlocated block undecorated");
                    forget_block(&mut doc, &mut blocks, pre, code);
                    continue;
                };
                let occurrence = assemble(&doc, code, language, &located, &self.settings);
                let overlays = inject_overlays(&mut doc, pre, code, &occurrence, &self.settings);

                blocks.retain(|block| block.overlays.code != code);
                blocks.push(TrackedBlock {
                    overlays,
                    lines: located.lines,
                });
                occurrences.push(occurrence);
            }
            blocks.retain(|block| doc.contains(block.overlays.code));
        }

        info!(decorated = occurrences.len(), "Processed code blocks");
        if !occurrences.is_empty() {
            self.schedule_reconcile();
        }
        occurrences
    }

    /// Decorates blocks backed by the buffer open for editing.
    pub fn process_live(
        &self,
        root: NodeId,
        locator: &LiveBufferLocator<'_>,
    ) -> Vec<CodeBlockOccurrence> {
        self.process_with(root, locator)
    }

    /// Decorates blocks from the stored text of `path`.
    ///
    /// A failed read leaves every block undecorated.
    #[instrument(skip(self, vault), fields(path = %path.display()))]
    pub async fn process_recovered<V>(
        &self,
        root: NodeId,
        path: &Path,
        vault: &V,
    ) -> Vec<CodeBlockOccurrence>
    where
        V: FileReader,
    {
        match RecoveredTextLocator::recover(vault, path).await {
            Ok(locator) => self.process_with(root, &locator),
            Err(e) => {
                warn!(error = %e, "Could not recover document text");
                Vec::new()
            }
        }
    }

    /// Decorates blocks, preferring the live buffer when one is available.
    ///
    /// The stored text is only read when some candidate block cannot be
    /// resolved against the live buffer.
    pub async fn process<V>(
        &self,
        root: NodeId,
        live: Option<LiveBufferLocator<'_>>,
        path: &Path,
        vault: &V,
    ) -> Vec<CodeBlockOccurrence>
    where
        V: FileReader,
    {
        let needs_recovery = match &live {
            None => true,
            Some(live) => self.with_document(|doc| {
                doc.code_blocks(root)
                    .into_iter()
                    .enumerate()
                    .any(|(position, (_, code))| {
                        candidate_language(doc, code, &self.settings).is_some()
                            && live.locate(doc, code, position).is_none()
                    })
            }),
        };

        let recovered = if needs_recovery {
            match RecoveredTextLocator::recover(vault, path).await {
                Ok(locator) => Some(locator),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Could not recover document text");
                    None
                }
            }
        } else {
            None
        };

        self.process_with(
            root,
            &Fallback {
                primary: live,
                secondary: recovered,
            },
        )
    }

    /// Layout changed (e.g. the panel was resized): re-measure after the delay.
    pub fn on_resize(&self) {
        self.schedule_reconcile();
    }

    /// Cancels any waiting reconciliation and runs one now. Returns the number
    /// of lines measured.
    pub fn reconcile_now(&self) -> usize {
        self.scheduler.cancel();
        reconcile_all(&self.document, &self.blocks, self.probe.as_ref())
    }

    pub fn is_reconcile_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Waits for a scheduled reconciliation to finish.
    ///
    /// ## Errors
    ///
    /// Returns an error if the reconciliation task panicked.
    pub async fn flush(&self) -> CodemarkResult<()> {
        self.scheduler.flush().await
    }

    fn schedule_reconcile(&self) {
        let document = Arc::clone(&self.document);
        let blocks = Arc::clone(&self.blocks);
        let probe = Arc::clone(&self.probe);
        self.scheduler.schedule(move || {
            reconcile_all(&document, &blocks, probe.as_ref());
        });
    }
}

fn reconcile_all(
    document: &Mutex<Document>,
    blocks: &Mutex<Vec<TrackedBlock>>,
    probe: &(dyn HeightProbe + Send + Sync),
) -> usize {
    let mut doc = lock(document);
    let blocks = lock(blocks);
    let measured = blocks
        .iter()
        .map(|block| reconcile_block(&mut doc, block, probe))
        .sum();
    debug!(blocks = blocks.len(), measured, "Reconciled overlay heights");
    measured
}

/// Strips the overlays of a block decorated on an earlier pass and stops
/// tracking it.
fn forget_block(doc: &mut Document, blocks: &mut Vec<TrackedBlock>, pre: NodeId, code: NodeId) {
    let before = blocks.len();
    blocks.retain(|block| block.overlays.code != code);
    if blocks.len() != before {
        debug!("Removing overlays of a block that is no longer decorated");
        remove_overlays(doc, pre);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
