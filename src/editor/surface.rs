use ropey::Rope;
use unicode_width::UnicodeWidthStr;

/// Caret or selection as byte offsets into the text.
///
/// Always `start <= end`, both on char boundaries. A caret has `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub start: usize,
    pub end: usize,
}

impl Selection {
    pub const fn caret(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub const fn is_caret(&self) -> bool {
        self.start == self.end
    }
}

/// Scroll position of the editable surface in CSS pixels.
///
/// May be fractional, as browsers report under zoom.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub left: f64,
    pub top: f64,
}

/// Font and box metrics used to turn text extents into scroll extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub line_height: f64,
    pub char_width: f64,
    /// Inner padding applied on every side of the text box.
    pub padding: f64,
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            char_width: 8.0,
            padding: 12.0,
        }
    }
}

/// Visible size of the editable surface in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// The real editable layer: text, selection, focus and scroll state.
///
/// Only [`super::OverlayEditor`] mutates a surface; everything else reads it.
pub struct EditorSurface {
    rope: Rope,
    selection: Selection,
    scroll: ScrollOffset,
    viewport: ViewportSize,
    metrics: SurfaceMetrics,
    content_width: f64,
    content_height: f64,
    focused: bool,
}

impl EditorSurface {
    pub(super) fn new(text: &str, metrics: SurfaceMetrics, viewport: ViewportSize) -> Self {
        let mut surface = Self {
            rope: Rope::new(),
            selection: Selection::default(),
            scroll: ScrollOffset::default(),
            viewport,
            metrics,
            content_width: 0.0,
            content_height: 0.0,
            focused: false,
        };
        surface.set_text(text);
        surface
    }

    /// The full text value.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text length in bytes.
    pub fn len(&self) -> usize {
        self.rope.len_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    pub const fn selection(&self) -> Selection {
        self.selection
    }

    pub const fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub const fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub const fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    pub const fn is_focused(&self) -> bool {
        self.focused
    }

    /// Largest scroll offsets the current content allows.
    pub fn max_scroll(&self) -> ScrollOffset {
        ScrollOffset {
            left: (self.content_width - self.viewport.width).max(0.0),
            top: (self.content_height - self.viewport.height).max(0.0),
        }
    }

    /// Replace the whole value. The caret moves to the end, like assigning a
    /// textarea's value.
    pub(super) fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.selection = Selection::caret(text.len());
    }

    /// Set the selection, clamping to the text and snapping to char boundaries.
    pub(super) fn select(&mut self, start: usize, end: usize) {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        self.selection = Selection {
            start: self.snap(start),
            end: self.snap(end),
        };
    }

    /// Replace the selection with `replacement` and leave the caret after it.
    ///
    /// Returns `false` if nothing changed.
    pub(super) fn replace_selection(&mut self, replacement: &str) -> bool {
        if replacement.is_empty() && self.selection.is_caret() {
            return false;
        }
        let start = self.rope.byte_to_char(self.selection.start);
        let end = self.rope.byte_to_char(self.selection.end);
        self.rope.remove(start..end);
        self.rope.insert(start, replacement);
        self.selection = Selection::caret(self.selection.start + replacement.len());
        true
    }

    /// Backspace: remove the selection, or the character before the caret.
    pub(super) fn delete_backward(&mut self) -> bool {
        if !self.selection.is_caret() {
            return self.replace_selection("");
        }
        let caret = self.rope.byte_to_char(self.selection.start);
        if caret == 0 {
            return false;
        }
        self.rope.remove(caret - 1..caret);
        self.selection = Selection::caret(self.rope.char_to_byte(caret - 1));
        true
    }

    /// Delete: remove the selection, or the character after the caret.
    pub(super) fn delete_forward(&mut self) -> bool {
        if !self.selection.is_caret() {
            return self.replace_selection("");
        }
        let caret = self.rope.byte_to_char(self.selection.start);
        if caret >= self.rope.len_chars() {
            return false;
        }
        self.rope.remove(caret..=caret);
        true
    }

    pub(super) const fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub(super) fn set_viewport(&mut self, viewport: ViewportSize) {
        self.viewport = viewport;
        self.clamp_scroll();
    }

    /// Accept a host-reported scroll position. Only the lower bound applies
    /// here; the extent clamp waits for the next measure or resize.
    pub(super) fn set_scroll(&mut self, left: f64, top: f64) {
        self.scroll = ScrollOffset {
            left: clamp_offset(left, f64::MAX),
            top: clamp_offset(top, f64::MAX),
        };
    }

    /// Recompute content extents for `text` and pull the scroll back inside them.
    pub(super) fn measure(&mut self, text: &str) {
        let mut lines = 0usize;
        let mut widest = 0usize;
        for line in text.split('\n') {
            lines += 1;
            widest = widest.max(line.trim_end_matches('\r').width());
        }
        let padding = self.metrics.padding * 2.0;
        // Line and column counts stay far below 2^52.
        #[allow(clippy::cast_precision_loss)]
        {
            self.content_width = widest as f64 * self.metrics.char_width + padding;
            self.content_height = lines as f64 * self.metrics.line_height + padding;
        }
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let max = self.max_scroll();
        self.scroll = ScrollOffset {
            left: clamp_offset(self.scroll.left, max.left),
            top: clamp_offset(self.scroll.top, max.top),
        };
    }

    fn snap(&self, offset: usize) -> usize {
        let offset = offset.min(self.rope.len_bytes());
        self.rope.char_to_byte(self.rope.byte_to_char(offset))
    }
}

fn clamp_offset(value: f64, max: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, max) } else { 0.0 }
}

impl std::fmt::Debug for EditorSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSurface")
            .field("rope", &format_args!("Rope({} bytes)", self.rope.len_bytes()))
            .field("selection", &self.selection)
            .field("scroll", &self.scroll)
            .field("viewport", &self.viewport)
            .field("focused", &self.focused)
            .finish_non_exhaustive()
    }
}
