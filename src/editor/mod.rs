//! Overlay editor: an editable surface with highlighted markup underneath.
//!
//! The editor is headless. It owns the real text (the [`EditorSurface`]) and
//! derives two read-only artifacts from it on every change: the
//! [`OverlayLayer`], a highlighted copy of the text shifted by the surface's
//! scroll offsets, and the [`LineGutter`]. A host paints those artifacts and
//! forwards input, key, scroll and resize events back.
//!
//! Every content change runs the same pipeline, in order: tokenize, paint the
//! overlay, recount lines, clamp and sync scroll, and finally notify the
//! change observer (user-driven changes only).

mod layers;
mod surface;

pub use layers::{LineGutter, OverlayLayer, line_count};
pub use surface::{EditorSurface, ScrollOffset, Selection, SurfaceMetrics, ViewportSize};

use std::sync::Arc;

use crate::highlight::{Highlighter, TokenSequence, escape_html};

/// Explicit configuration handed to an editor at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Spaces inserted by the Tab key.
    pub indent_width: usize,
    pub metrics: SurfaceMetrics,
    pub viewport: ViewportSize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            indent_width: 2,
            metrics: SurfaceMetrics::default(),
            viewport: ViewportSize::default(),
        }
    }
}

/// Lifecycle of an editor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Uninitialized,
    Ready,
}

/// Snapshot handed to a [`ChangeObserver`] after a user-driven change.
///
/// By the time it is delivered the overlay, gutter and scroll are already
/// up to date.
#[derive(Debug, Clone, Copy)]
pub struct ChangeEvent<'a> {
    pub text: &'a str,
    /// Overlay markup, including its trailing newline.
    pub markup: &'a str,
    pub line_count: usize,
}

/// Receives a notification after every user-driven change.
pub trait ChangeObserver {
    fn on_change(&mut self, event: &ChangeEvent<'_>);
}

impl<F> ChangeObserver for F
where
    F: FnMut(&ChangeEvent<'_>),
{
    fn on_change(&mut self, event: &ChangeEvent<'_>) {
        self(event);
    }
}

/// An input event as delivered by the host after it has happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Typed, pasted or dropped text (Enter arrives as `"\n"`). Replaces the
    /// selection as a single edit.
    Insert(String),
    DeleteBackward,
    DeleteForward,
}

/// A key press, delivered before the host applies its default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Tab,
    Other,
}

/// Whether the host should still run its default action for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The editor consumed the key; suppress the default.
    Handled,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Notify {
    Observer,
    Silent,
}

/// Editable text with a co-registered highlighted overlay and line gutter.
pub struct OverlayEditor {
    highlighter: Arc<Highlighter>,
    config: EditorConfig,
    state: EditorState,
    surface: EditorSurface,
    tokens: TokenSequence,
    overlay: OverlayLayer,
    gutter: LineGutter,
    observer: Option<Box<dyn ChangeObserver>>,
}

impl OverlayEditor {
    /// Build an editor seeded with `initial`.
    ///
    /// The initial render is silent: no observer is attached yet, and
    /// programmatic setup never notifies.
    pub fn new(initial: &str, config: EditorConfig) -> Self {
        let mut editor = Self {
            highlighter: Highlighter::mermaid(),
            config,
            state: EditorState::Uninitialized,
            surface: EditorSurface::new(initial, config.metrics, config.viewport),
            tokens: TokenSequence::default(),
            overlay: OverlayLayer::default(),
            gutter: LineGutter::default(),
            observer: None,
        };
        editor.refresh(Notify::Silent);
        editor.state = EditorState::Ready;
        editor
    }

    /// Attach the observer notified after user-driven changes.
    pub fn with_on_change(mut self, observer: impl ChangeObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Highlight with a custom rule set instead of the built-in one.
    ///
    /// Takes an owned [`Highlighter`] or a shared `Arc` of one.
    pub fn with_highlighter(mut self, highlighter: impl Into<Arc<Highlighter>>) -> Self {
        self.highlighter = highlighter.into();
        self.refresh(Notify::Silent);
        self
    }

    pub const fn state(&self) -> EditorState {
        self.state
    }

    pub const fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The current text value, verbatim.
    pub fn get_value(&self) -> String {
        self.surface.text()
    }

    /// Replace the text programmatically, e.g. after loading a file.
    ///
    /// Runs the full render pipeline but never notifies the observer.
    pub fn set_value(&mut self, text: &str) {
        self.surface.set_text(text);
        self.refresh(Notify::Silent);
    }

    pub fn focus(&mut self) {
        self.surface.set_focused(true);
    }

    pub const fn is_focused(&self) -> bool {
        self.surface.is_focused()
    }

    /// Move the caret (`start == end`) or select a range of byte offsets.
    pub fn select(&mut self, start: usize, end: usize) {
        self.surface.select(start, end);
    }

    /// Apply a user edit, re-render, and notify once.
    ///
    /// Edits that change nothing (Backspace at the start, Delete at the end)
    /// are dropped without rendering or notifying.
    pub fn handle_input(&mut self, input: InputEvent) {
        let changed = match input {
            InputEvent::Insert(text) => self.surface.replace_selection(&text),
            InputEvent::DeleteBackward => self.surface.delete_backward(),
            InputEvent::DeleteForward => self.surface.delete_forward(),
        };
        if changed {
            self.refresh(Notify::Observer);
        }
    }

    /// Intercept keys the editor overrides.
    ///
    /// Tab inserts `indent_width` spaces over the selection instead of moving
    /// focus.
    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        match key {
            Key::Tab => {
                let indent = " ".repeat(self.config.indent_width);
                self.surface.replace_selection(&indent);
                self.refresh(Notify::Observer);
                KeyOutcome::Handled
            }
            Key::Other => KeyOutcome::Ignored,
        }
    }

    /// The surface was scrolled to `(left, top)`.
    ///
    /// The host's scroll position is trusted as-is; only negative and
    /// non-finite offsets are rejected. Re-renders and resizes pull it back
    /// within the measured content.
    pub fn scroll_to(&mut self, left: f64, top: f64) {
        self.surface.set_scroll(left, top);
        self.sync_scroll();
    }

    /// The surface's visible size changed.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.surface.set_viewport(ViewportSize { width, height });
        self.sync_scroll();
    }

    pub const fn surface(&self) -> &EditorSurface {
        &self.surface
    }

    pub const fn overlay(&self) -> &OverlayLayer {
        &self.overlay
    }

    pub const fn gutter(&self) -> &LineGutter {
        &self.gutter
    }

    pub const fn tokens(&self) -> &TokenSequence {
        &self.tokens
    }

    pub const fn line_count(&self) -> usize {
        self.gutter.count()
    }

    /// Inner structure for the editor's container element, populated with
    /// the current gutter, overlay and text.
    pub fn scaffold_html(&self) -> String {
        let text = self.surface.text();
        format!(
            concat!(
                "<div class=\"editor-wrapper\">\n",
                "  <div class=\"line-numbers\" aria-hidden=\"true\">{gutter}</div>\n",
                "  <div class=\"editor-content\">\n",
                "    <pre class=\"highlight-layer\" aria-hidden=\"true\">",
                "<code style=\"transform: {transform}\">{overlay}</code></pre>\n",
                "    <textarea class=\"editor-textarea\" spellcheck=\"false\">{text}</textarea>\n",
                "  </div>\n",
                "</div>\n",
            ),
            gutter = self.gutter.markup(),
            transform = self.overlay.transform(),
            overlay = self.overlay.markup(),
            text = escape_html(&text),
        )
    }

    fn refresh(&mut self, notify: Notify) {
        let _scope = crate::perf::scope("editor.refresh");
        let text = self.surface.text();

        self.tokens = self.highlighter.tokenize(&text);
        self.overlay.paint(&self.tokens, &text);
        self.gutter.set_count(line_count(&text));
        self.surface.measure(&text);
        self.sync_scroll();

        tracing::trace!(
            bytes = text.len(),
            spans = self.tokens.len(),
            lines = self.gutter.count(),
            "editor refreshed"
        );
        crate::perf::log_event(
            "editor.refresh",
            format!(
                "bytes={} spans={} lines={} notify={:?}",
                text.len(),
                self.tokens.len(),
                self.gutter.count(),
                notify
            ),
        );

        if notify == Notify::Silent {
            return;
        }
        if let Some(observer) = self.observer.as_mut() {
            observer.on_change(&ChangeEvent {
                text: &text,
                markup: self.overlay.markup(),
                line_count: self.gutter.count(),
            });
        }
    }

    fn sync_scroll(&mut self) {
        let scroll = self.surface.scroll();
        let left = round_px(scroll.left);
        let top = round_px(scroll.top);
        self.overlay.set_translate(-left, -top);
        self.gutter.set_scroll_top(top);
    }
}

fn round_px(value: f64) -> i64 {
    // Scroll offsets are clamped, finite and non-negative.
    #[allow(clippy::cast_possible_truncation)]
    {
        value.round() as i64
    }
}

impl std::fmt::Debug for OverlayEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayEditor")
            .field("state", &self.state)
            .field("surface", &self.surface)
            .field("spans", &self.tokens.len())
            .field("lines", &self.gutter.count())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}
