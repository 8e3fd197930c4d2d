//! # codemark
//!
//! Renders a markdown file the way a reading view would, with every annotated
//! code block carrying its title bar, line-number column and highlighted
//! lines.
//!
//! ## Usage
//!
//! ```bash
//! # HTML with the overlay stylesheet
//! codemark notes.md > notes.html
//!
//! # Skip some languages, add a dividing line next to the numbers
//! codemark notes.md --exclude mermaid --exclude dataview --dividing-line
//!
//! # Settings from a host-style settings file
//! codemark notes.md --config settings.json
//!
//! # The assembled code block records instead of HTML
//! codemark notes.md --json
//! ```
//!
//! ## Annotations
//!
//! ````markdown
//! ```python TI:"demo.py" HL:"1-2,4" "FOLD"
//! ````
//!
//! - `TI:"…"` title shown in the title bar
//! - `HL:"…"` lines to highlight (`N` or `N-M`, comma separated)
//! - `"FOLD"` render the block collapsed

use codemark_lib::block::{CodeBlockOccurrence, RecoveredTextLocator};
use codemark_lib::dom::Document;
use codemark_lib::reading::{MonospaceProbe, ReadingView, render_markdown};
use codemark_lib::source::{FileReader, FsVault};
use codemark_lib::styles::generate_styles;
use codemark_lib::{CodemarkResult, Settings};
use color_eyre::eyre::{Context, Result};
use tracing::info;

pub use cli::Cli;

mod cli {
    use clap::Parser;
    use std::path::PathBuf;

    /// Command-line interface for the codemark renderer.
    #[derive(Parser, Debug)]
    #[command(
        name = "codemark",
        about = "Render markdown code blocks with titles, line numbers and highlighted lines",
        version
    )]
    pub struct Cli {
        /// Markdown file to render
        pub input: PathBuf,

        /// Settings file (.json, .yaml or .yml) using the host's keys
        #[arg(long, value_name = "FILE")]
        pub config: Option<PathBuf>,

        /// Leave blocks of this language undecorated (repeatable)
        #[arg(long = "exclude", value_name = "LANG")]
        pub exclude: Vec<String>,

        /// Do not add line-number columns
        #[arg(long)]
        pub no_line_numbers: bool,

        /// Draw a dividing line right of the line numbers
        #[arg(long)]
        pub dividing_line: bool,

        /// Do not show the language name in the title bar
        #[arg(long)]
        pub no_lang_name: bool,

        /// Width in pixels available to code lines, used to measure wrapping
        #[arg(long, value_name = "PX", default_value_t = 640.0)]
        pub width: f64,

        /// Print the assembled code block records as JSON instead of HTML
        #[arg(long)]
        pub json: bool,

        /// Omit the <style> block from HTML output
        #[arg(long)]
        pub no_styles: bool,

        /// Increase verbosity (-v INFO, -vv DEBUG, -vvv TRACE, -vvvv TRACE with file/line)
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        pub verbose: u8,
    }
}

impl Cli {
    /// Settings from `--config` (or the defaults) with the command-line
    /// overrides applied.
    ///
    /// ## Errors
    ///
    /// Returns an error if the settings file cannot be read or decoded.
    pub fn settings(&self) -> CodemarkResult<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        settings
            .exclude_langs
            .extend(self.exclude.iter().map(|lang| lang.trim().to_string()));
        if self.no_line_numbers {
            settings.show_line_number = false;
        }
        if self.dividing_line {
            settings.show_dividing_line = true;
        }
        if self.no_lang_name {
            settings.show_lang_name_in_top_right = false;
        }
        Ok(settings)
    }

    fn probe(&self) -> MonospaceProbe {
        MonospaceProbe {
            available_width: self.width,
            ..MonospaceProbe::default()
        }
    }
}

/// Renders the input file and returns what should be printed.
///
/// ## Errors
///
/// Returns an error for unreadable input or settings.
pub async fn run(cli: &Cli) -> Result<String> {
    let settings = cli
        .settings()
        .wrap_err_with(|| format!("Failed to load settings from {:?}", cli.config))?;

    let text = FsVault::new()
        .read_text(&cli.input)
        .await
        .wrap_err_with(|| format!("Failed to read {:?}", cli.input))?;

    let mut doc = Document::new();
    let root = render_markdown(&mut doc, &text);
    let view = ReadingView::new(doc, settings.clone(), cli.probe());

    let occurrences = view.process_with(root, &RecoveredTextLocator::from_text(&text));
    let measured = view.reconcile_now();
    info!(
        blocks = occurrences.len(),
        measured,
        "Decorated {}",
        cli.input.display()
    );

    if cli.json {
        return occurrences_json(&occurrences);
    }

    let html = view.with_document(|doc| doc.to_html(root));
    if cli.no_styles {
        Ok(html)
    } else {
        Ok(format!("{}{}", generate_styles(&settings), html))
    }
}

fn occurrences_json(occurrences: &[CodeBlockOccurrence]) -> Result<String> {
    serde_json::to_string_pretty(occurrences).wrap_err("Failed to serialize code blocks")
}
