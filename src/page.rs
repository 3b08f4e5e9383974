//! Standalone HTML export of an editor view.
//!
//! Wraps [`OverlayEditor::scaffold_html`] in a page with the stylesheet that
//! stacks the transparent textarea over the highlight layer and colors the
//! eight span classes.

use std::fmt::Write as _;

use crate::editor::OverlayEditor;
use crate::highlight::{Category, escape_html};

/// Foreground color for a category's spans.
pub const fn category_color(category: Category) -> &'static str {
    match category {
        Category::Comment => "#6a737d",
        Category::Keyword => "#d73a49",
        Category::Direction => "#e36209",
        Category::Control => "#6f42c1",
        Category::Arrow => "#005cc5",
        Category::String => "#22863a",
        Category::Label => "#032f62",
        Category::Decision => "#b31d28",
    }
}

const BASE_CSS: &str = "\
.editor-wrapper { display: flex; height: 100%; font: 13px/20px ui-monospace, monospace; }
.line-numbers { overflow: hidden; padding: 12px 8px; text-align: right; color: #959da5; user-select: none; }
.line-numbers span { display: block; }
.editor-content { position: relative; flex: 1; overflow: hidden; }
.highlight-layer, .editor-textarea { margin: 0; padding: 12px; border: 0; font: inherit; white-space: pre; tab-size: 2; }
.highlight-layer { position: absolute; inset: 0; pointer-events: none; overflow: visible; }
.highlight-layer code { display: block; will-change: transform; }
.editor-textarea { position: absolute; inset: 0; width: 100%; height: 100%; resize: none; overflow: auto;
  color: transparent; background: transparent; caret-color: #24292e; }
";

/// Stylesheet for the editor structure and the category classes.
pub fn stylesheet() -> String {
    let mut css = String::from(BASE_CSS);
    for category in Category::ALL {
        let _ = writeln!(
            css,
            ".{} {{ color: {}; }}",
            category.css_class(),
            category_color(category)
        );
    }
    css
}

/// A complete HTML document showing `editor` as it currently stands.
pub fn standalone_page(editor: &OverlayEditor, title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
         <style>\n{css}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
        css = stylesheet(),
        body = editor.scaffold_html(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::EditorConfig;

    #[test]
    fn test_stylesheet_covers_every_category() {
        let css = stylesheet();
        for category in Category::ALL {
            assert!(
                css.contains(&format!(".{} {{", category.css_class())),
                "missing rule for {category}"
            );
        }
    }

    #[test]
    fn test_page_embeds_scaffold_and_escaped_title() {
        let editor = OverlayEditor::new("graph TD", EditorConfig::default());
        let page = standalone_page(&editor, "a<b>.mmd");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>a&lt;b&gt;.mmd</title>"));
        assert!(page.contains(&editor.scaffold_html()));
    }
}
