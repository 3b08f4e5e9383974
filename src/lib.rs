// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorConfig)
    clippy::module_name_repetitions
)]

//! # mmdpad
//!
//! Syntax-highlighted editing for mermaid diagram source.
//!
//! An editable text surface is kept pixel-aligned with a highlighted,
//! read-only copy of the same text, so colored markup appears to live
//! inside the text field:
//! - Regex-driven tokenizer with greedy overlap resolution
//! - HTML-safe markup with one class per token category
//! - Line-number gutter and scroll synchronization
//! - Live reload of a watched diagram file
//!
//! ## Modules
//!
//! - [`highlight`]: Tokenizer and markup serialization
//! - [`editor`]: Headless overlay editor (surface, overlay, gutter)
//! - [`page`]: Standalone HTML export
//! - [`config`]: Persistent default flags
//! - [`watcher`]: File watching
//! - [`perf`]: Timing scopes and debug event log

pub mod config;
pub mod editor;
pub mod highlight;
pub mod page;
pub mod perf;
pub mod watcher;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::editor::{ChangeEvent, ChangeObserver, EditorConfig, OverlayEditor};
    pub use crate::highlight::{Category, Highlighter, Span, TokenSequence};
}
