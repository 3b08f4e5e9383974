//! HTML serialization of token sequences.

use std::borrow::Cow;
use std::fmt::Write as _;

use super::{Fragment, TokenSequence};

const RESERVED: &[char] = &['&', '<', '>'];

/// Escape the three characters that could open markup in the host document.
///
/// Quotes are left alone; the output is only ever placed in element content.
/// Borrows the input when nothing needs escaping.
pub fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(RESERVED) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

pub(super) fn write_markup(tokens: &TokenSequence, source: &str) -> String {
    let mut markup = String::with_capacity(source.len() + tokens.len() * 32);
    for fragment in tokens.fragments(source) {
        match fragment {
            Fragment::Plain(text) => markup.push_str(&escape_html(text)),
            Fragment::Token(span) => {
                // Writing into a String cannot fail.
                let _ = write!(
                    markup,
                    r#"<span class="{}">{}</span>"#,
                    span.category.css_class(),
                    escape_html(&span.text)
                );
            }
        }
    }
    markup
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_borrows_clean_text() {
        assert!(matches!(escape_html("A --- B"), Cow::Borrowed("A --- B")));
    }

    #[test]
    fn test_escape_html_replaces_reserved_characters() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
    }

    #[test]
    fn test_escape_html_leaves_quotes_untouched() {
        assert_eq!(escape_html(r#""it's" <x>"#), r#""it's" &lt;x&gt;"#);
    }

    #[test]
    fn test_escape_html_handles_multibyte_neighbors() {
        assert_eq!(escape_html("é<ü"), "é&lt;ü");
    }
}
