//! Fence-line annotations for rendered code blocks.
//!
//! A fenced code block can carry a title, highlighted lines and a fold flag in
//! its opening fence line:
//!
//! ````markdown
//! ```python TI:"demo.py" HL:"1-2,4" "FOLD"
//! import os
//! ...
//! ```
//! ````
//!
//! This library turns those annotations into visual metadata for two rendering
//! contexts that must agree with each other:
//!
//! - **Live preview**: a viewport-scoped [`DecorationSet`](live::DecorationSet)
//!   rebuilt wholesale on every document, viewport or reset update.
//! - **Reading view**: title bar, line-number column and highlight column
//!   injected next to a rendered `<pre><code>` block, then kept height-aligned
//!   with soft-wrapped source lines by a deferred reconciliation pass.
//!
//! ## Modules
//!
//! - [`dsl`] - Fence-line directive grammar and line-range expansion
//! - [`source`] - Line-text accessors, structural section index, vaults
//! - [`dom`] - In-memory DOM model the reading view mutates
//! - [`block`] - Code block locator strategies and metadata assembly
//! - [`live`] - Live-preview syntax walk and decorations
//! - [`reading`] - Reading-view rendering, overlays and height reconciliation
//! - [`config`] - Host-persisted settings
//! - [`styles`] - Stylesheet for the overlay classes
//!
//! ## Examples
//!
//! ```
//! use codemark_lib::dsl::parse_fence_line;
//!
//! let directives = parse_fence_line(r#"```python TI:"demo.py" HL:"1-2,4""#);
//! assert_eq!(directives.language, "python");
//! assert_eq!(directives.title, "demo.py");
//! assert!(directives.highlight_lines.contains(4));
//! assert!(!directives.collapsed);
//! ```

pub mod block;
pub mod config;
pub mod dom;
pub mod dsl;
pub mod live;
pub mod reading;
pub mod source;
pub mod styles;
mod types;

pub use config::Settings;
pub use types::{CodemarkError, CodemarkResult};
