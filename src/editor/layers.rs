use std::fmt::Write as _;

use crate::highlight::TokenSequence;

/// The decorative copy of the text stacked under the editable surface.
///
/// Derived entirely from the surface: it is repainted from scratch on every
/// change and translated by the negated, pixel-rounded scroll offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayLayer {
    markup: String,
    translate: (i64, i64),
}

impl OverlayLayer {
    /// Highlighted markup including the trailing newline that keeps the last
    /// line's height when it is empty.
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Visual offset `(x, y)` in whole pixels.
    pub const fn translate(&self) -> (i64, i64) {
        self.translate
    }

    /// CSS transform positioning the layer.
    pub fn transform(&self) -> String {
        format!(
            "translate3d({}px, {}px, 0)",
            self.translate.0, self.translate.1
        )
    }

    pub(super) fn paint(&mut self, tokens: &TokenSequence, text: &str) {
        self.markup = tokens.to_markup(text);
        self.markup.push('\n');
    }

    pub(super) const fn set_translate(&mut self, x: i64, y: i64) {
        self.translate = (x, y);
    }
}

/// Line-number column beside the surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineGutter {
    count: usize,
    scroll_top: i64,
}

impl Default for LineGutter {
    fn default() -> Self {
        Self {
            count: 1,
            scroll_top: 0,
        }
    }
}

impl LineGutter {
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Vertical scroll offset in whole pixels, mirroring the surface.
    pub const fn scroll_top(&self) -> i64 {
        self.scroll_top
    }

    /// Labels `1..=count`, in order.
    pub fn labels(&self) -> impl Iterator<Item = usize> {
        1..=self.count
    }

    /// One `<span>` per line.
    pub fn markup(&self) -> String {
        let mut markup = String::with_capacity(self.count * 16);
        for label in self.labels() {
            let _ = write!(markup, "<span>{label}</span>");
        }
        markup
    }

    pub(super) const fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    pub(super) const fn set_scroll_top(&mut self, top: i64) {
        self.scroll_top = top;
    }
}

/// Number of `\n`-separated segments; empty text still has one line.
pub fn line_count(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count() + 1
}
