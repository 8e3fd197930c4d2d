//! Keeping overlay rows as tall as the code lines they sit next to.
//!
//! A long source line soft-wraps into several visual rows, so a fixed row
//! height in the number and highlight columns drifts out of alignment. After
//! layout settles each content line is rendered into a throwaway probe styled
//! like the code element, measured, and its height stamped onto the matching
//! row of both columns.

use super::overlay::OverlayHandles;
use crate::dom::{Document, NodeId};
use crate::types::CodemarkResult;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use textwrap::{Options, WordSplitter};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

/// Delay letting the host's layout pass settle before measuring.
pub const DEFAULT_RECONCILE_DELAY: Duration = Duration::from_millis(100);

/// Measures the rendered height of a probe element, in pixels.
pub trait HeightProbe {
    fn measure(&self, doc: &Document, probe: NodeId) -> f64;
}

/// Height of monospace text soft-wrapped to a fixed width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceProbe {
    pub char_width: f64,
    pub line_height: f64,
    pub available_width: f64,
}

impl Default for MonospaceProbe {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            available_width: 640.0,
        }
    }
}

impl MonospaceProbe {
    pub fn new(char_width: f64, line_height: f64, available_width: f64) -> Self {
        Self {
            char_width,
            line_height,
            available_width,
        }
    }

    /// Characters per visual row (at least one).
    pub fn columns(&self) -> usize {
        if self.char_width <= 0.0 {
            return usize::MAX;
        }
        ((self.available_width / self.char_width).floor() as usize).max(1)
    }

    /// Visual rows `text` occupies. Empty text still takes one row.
    pub fn rows(&self, text: &str) -> usize {
        if text.is_empty() {
            return 1;
        }
        let options = Options::new(self.columns())
            .break_words(true)
            .word_splitter(WordSplitter::NoHyphenation);
        textwrap::wrap(text, options).len().max(1)
    }
}

impl HeightProbe for MonospaceProbe {
    fn measure(&self, doc: &Document, probe: NodeId) -> f64 {
        self.rows(&doc.text_content(probe)) as f64 * self.line_height
    }
}

/// A block whose overlays take part in reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedBlock {
    pub overlays: OverlayHandles,
    /// Source text of each content line.
    pub lines: Vec<String>,
}

/// Stamps measured heights onto the rows of one block. Returns the number of
/// lines measured.
///
/// Lines without source text are skipped and keep their current height. A
/// block whose code element is gone is left alone.
pub fn reconcile_block(doc: &mut Document, block: &TrackedBlock, probe: &dyn HeightProbe) -> usize {
    let overlays = &block.overlays;
    if !doc.contains(overlays.code) {
        return 0;
    }
    let numbers = overlays.number_rows(doc).to_vec();
    let highlights = overlays.highlight_rows(doc).to_vec();
    if numbers.is_empty() && highlights.is_empty() {
        return 0;
    }

    let rows = numbers.len().max(highlights.len());
    let mut measured = 0;
    for (index, text) in block.lines.iter().take(rows).enumerate() {
        let element = doc.create_element("div");
        doc.copy_presentation(overlays.code, element);
        doc.set_text(element, text);
        let height = format!("{}px", probe.measure(doc, element));
        doc.remove(element);

        for row in [numbers.get(index), highlights.get(index)].into_iter().flatten() {
            doc.set_style(*row, "height", &height);
        }
        measured += 1;
    }

    trace!(measured, rows, "Reconciled row heights");
    measured
}

/// Runs at most one deferred reconciliation at a time.
///
/// Scheduling a new task aborts one that has not run yet. Outside a tokio
/// runtime the task runs immediately.
#[derive(Debug)]
pub struct ReconcileScheduler {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ReconcileScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_RECONCILE_DELAY)
    }
}

impl ReconcileScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `task` after the delay, replacing any task still waiting.
    pub fn schedule<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending();
        if let Some(previous) = pending.take() {
            if !previous.is_finished() {
                trace!("Superseding pending reconciliation");
            }
            previous.abort();
        }

        match Handle::try_current() {
            Ok(handle) => {
                let delay = self.delay;
                *pending = Some(handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    task();
                }));
            }
            Err(_) => {
                drop(pending);
                task();
            }
        }
    }

    /// Aborts the waiting task, if any. Returns whether one was waiting.
    pub fn cancel(&self) -> bool {
        match self.pending().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Waits for the scheduled task to finish.
    ///
    /// ## Errors
    ///
    /// Returns an error if the task panicked.
    pub async fn flush(&self) -> CodemarkResult<()> {
        let handle = self.pending().take();
        if let Some(handle) = handle {
            handle.await?;
        }
        Ok(())
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.pending().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{CodeBlockOccurrence, SourceExtent};
    use crate::config::Settings;
    use crate::dsl::parse_fence_line;
    use crate::reading::overlay::inject_overlays;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tracked(doc: &mut Document, fence: &str, lines: &[&str]) -> TrackedBlock {
        let pre = doc.create_element("pre");
        let code = doc.create_element_with_class("code", "language-rs");
        doc.set_style(code, "font-size", "14px");
        doc.append_child(pre, code);
        let directives = parse_fence_line(fence);
        let occurrence = CodeBlockOccurrence {
            language: directives.language.clone(),
            line_count: lines.len(),
            directives,
            extent: SourceExtent::new(0, lines.len() + 1),
        };
        let overlays = inject_overlays(doc, pre, code, &occurrence, &Settings::default());
        TrackedBlock {
            overlays,
            lines: lines.iter().map(|line| line.to_string()).collect(),
        }
    }

    #[test]
    fn test_monospace_rows() {
        let probe = MonospaceProbe::new(10.0, 20.0, 100.0);
        assert_eq!(probe.columns(), 10);
        assert_eq!(probe.rows(""), 1);
        assert_eq!(probe.rows("short"), 1);
        assert_eq!(probe.rows("aaaa bbbb cccc"), 2);
        assert_eq!(probe.rows(&"x".repeat(25)), 3);
    }

    #[test]
    fn test_monospace_columns_never_zero() {
        assert_eq!(MonospaceProbe::new(10.0, 20.0, 5.0).columns(), 1);
        assert_eq!(MonospaceProbe::new(0.0, 20.0, 5.0).rows(&"x".repeat(500)), 1);
    }

    #[test]
    fn test_reconcile_stamps_both_columns() {
        let mut doc = Document::new();
        let long = "y".repeat(30);
        let block = tracked(&mut doc, r#"```rs HL:"2""#, &["short", long.as_str(), "z"]);
        let probe = MonospaceProbe::new(10.0, 20.0, 100.0);
        let before = doc.len();

        assert_eq!(reconcile_block(&mut doc, &block, &probe), 3);
        assert_eq!(doc.len(), before);

        let heights = |rows: &[NodeId]| -> Vec<String> {
            rows.iter()
                .map(|row| doc.style(*row, "height").unwrap_or_default().to_string())
                .collect()
        };
        let expected = vec!["20px", "60px", "20px"];
        assert_eq!(heights(block.overlays.number_rows(&doc)), expected);
        assert_eq!(heights(block.overlays.highlight_rows(&doc)), expected);
    }

    #[test]
    fn test_reconcile_probe_matches_code_presentation() {
        struct ClassCheck;
        impl HeightProbe for ClassCheck {
            fn measure(&self, doc: &Document, probe: NodeId) -> f64 {
                assert!(doc.has_class(probe, "language-rs"));
                assert_eq!(doc.style(probe, "font-size"), Some("14px"));
                assert!(doc.parent(probe).is_none());
                12.0
            }
        }
        let mut doc = Document::new();
        let block = tracked(&mut doc, "```rs", &["a"]);
        reconcile_block(&mut doc, &block, &ClassCheck);
        assert_eq!(
            doc.style(block.overlays.number_rows(&doc)[0], "height"),
            Some("12px")
        );
    }

    #[test]
    fn test_reconcile_skips_rows_without_text() {
        let mut doc = Document::new();
        let mut block = tracked(&mut doc, "```rs", &["a", "b", "c"]);
        block.lines.truncate(1);
        assert_eq!(reconcile_block(&mut doc, &block, &MonospaceProbe::default()), 1);
        let rows = block.overlays.number_rows(&doc);
        assert!(doc.style(rows[0], "height").is_some());
        assert!(doc.style(rows[2], "height").is_none());
    }

    #[test]
    fn test_reconcile_after_teardown_is_noop() {
        let mut doc = Document::new();
        let block = tracked(&mut doc, "```rs", &["a"]);
        doc.remove(block.overlays.pre);
        assert_eq!(reconcile_block(&mut doc, &block, &MonospaceProbe::default()), 0);
    }

    #[test]
    fn test_scheduler_runs_inline_without_runtime() {
        let scheduler = ReconcileScheduler::default();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        scheduler.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_waits_for_delay() {
        let scheduler = ReconcileScheduler::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        scheduler.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_pending());
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_supersedes_pending_task() {
        let scheduler = ReconcileScheduler::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let counter = runs.clone();
            scheduler.schedule(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        scheduler.flush().await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scheduler_cancel() {
        let scheduler = ReconcileScheduler::new(Duration::from_millis(50));
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        scheduler.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.cancel());
        assert!(!scheduler.cancel());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        scheduler.flush().await.unwrap();
    }
}
