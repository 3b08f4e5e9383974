//! Syntax highlighting for mermaid diagram source.
//!
//! Highlighting is regex-driven, not grammar-driven. Every rule scans the
//! whole text on its own, all matches are pooled, and a single greedy
//! left-to-right sweep keeps the first non-overlapping match at each
//! position. Anything no rule claims is emitted as plain text.
//!
//! ```
//! use mmdpad::highlight::{Category, tokenize};
//!
//! let tokens = tokenize("graph TD");
//! let categories: Vec<_> = tokens.iter().map(|span| span.category).collect();
//! assert_eq!(categories, [Category::Keyword, Category::Direction]);
//! ```

mod markup;
mod rules;

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub use markup::escape_html;

/// Classification assigned to a highlighted span.
///
/// The set is closed: stylesheets key off [`Category::css_class`], so no
/// other label is ever emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Comment,
    Keyword,
    Direction,
    Control,
    Arrow,
    String,
    Label,
    Decision,
}

impl Category {
    pub const ALL: [Self; 8] = [
        Self::Comment,
        Self::Keyword,
        Self::Direction,
        Self::Control,
        Self::Arrow,
        Self::String,
        Self::Label,
        Self::Decision,
    ];

    /// The wire label for this category.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::Keyword => "keyword",
            Self::Direction => "direction",
            Self::Control => "control",
            Self::Arrow => "arrow",
            Self::String => "string",
            Self::Label => "label",
            Self::Decision => "decision",
        }
    }

    /// CSS class used to wrap spans of this category.
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Comment => "hl-comment",
            Self::Keyword => "hl-keyword",
            Self::Direction => "hl-direction",
            Self::Control => "hl-control",
            Self::Arrow => "hl-arrow",
            Self::String => "hl-string",
            Self::Label => "hl-label",
            Self::Decision => "hl-decision",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised while building a rule set.
#[derive(Debug, Error)]
pub enum HighlightError {
    #[error("invalid {category} pattern `{pattern}`")]
    InvalidPattern {
        category: Category,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled matcher paired with the category its matches receive.
#[derive(Debug, Clone)]
pub struct PatternRule {
    matcher: Regex,
    category: Category,
}

impl PatternRule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::InvalidPattern`] if `pattern` is not a valid regex.
    pub fn new(pattern: &str, category: Category) -> Result<Self, HighlightError> {
        let matcher = Regex::new(pattern).map_err(|source| HighlightError::InvalidPattern {
            category,
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { matcher, category })
    }

    pub const fn category(&self) -> Category {
        self.category
    }

    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }
}

/// A classified region of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    pub category: Category,
    /// `source[start..end]`.
    pub text: String,
}

/// One piece of the source in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Unclassified text between (or around) spans.
    Plain(&'a str),
    /// A classified span.
    Token(&'a Span),
}

/// Start-sorted, non-overlapping spans derived from one source string.
///
/// The gaps between spans are implicit plain text; see [`TokenSequence::fragments`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenSequence {
    spans: Vec<Span>,
    source_len: usize,
}

impl TokenSequence {
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.spans.iter()
    }

    /// Number of classified spans (gaps are not counted).
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Length in bytes of the source this sequence was derived from.
    pub const fn source_len(&self) -> usize {
        self.source_len
    }

    /// Walk `source` in order, alternating plain gaps and classified spans.
    ///
    /// `source` must be the text this sequence was tokenized from. A
    /// mismatched source yields truncated gaps rather than panicking.
    pub fn fragments<'a>(&'a self, source: &'a str) -> Fragments<'a> {
        Fragments {
            spans: self.spans.iter(),
            source,
            pos: 0,
            pending: None,
        }
    }

    /// Serialize to escaped, class-annotated markup.
    pub fn to_markup(&self, source: &str) -> String {
        markup::write_markup(self, source)
    }
}

impl<'a> IntoIterator for &'a TokenSequence {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.iter()
    }
}

/// Iterator returned by [`TokenSequence::fragments`].
#[derive(Debug, Clone)]
pub struct Fragments<'a> {
    spans: std::slice::Iter<'a, Span>,
    source: &'a str,
    pos: usize,
    pending: Option<&'a Span>,
}

impl<'a> Iterator for Fragments<'a> {
    type Item = Fragment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = match self.pending.take() {
            Some(span) => span,
            None => match self.spans.next() {
                Some(span) => span,
                None => {
                    if self.pos >= self.source.len() {
                        return None;
                    }
                    let rest = self.source.get(self.pos..).unwrap_or_default();
                    self.pos = self.source.len();
                    return Some(Fragment::Plain(rest));
                }
            },
        };

        if span.start > self.pos {
            let gap = self.source.get(self.pos..span.start).unwrap_or_default();
            self.pos = span.start;
            self.pending = Some(span);
            return Some(Fragment::Plain(gap));
        }

        self.pos = span.end;
        Some(Fragment::Token(span))
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    priority: usize,
}

/// An ordered, immutable rule set.
#[derive(Debug, Clone)]
pub struct Highlighter {
    rules: Vec<PatternRule>,
}

impl Highlighter {
    /// Compile `(pattern, category)` pairs in priority order.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn new(rules: &[(&str, Category)]) -> Result<Self, HighlightError> {
        let rules = rules
            .iter()
            .map(|(pattern, category)| PatternRule::new(pattern, *category))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rules(rules))
    }

    pub const fn from_rules(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// The built-in mermaid rule set, compiled on first use and shared.
    pub fn mermaid() -> Arc<Self> {
        static MERMAID: OnceLock<Arc<Highlighter>> = OnceLock::new();
        Arc::clone(MERMAID.get_or_init(|| {
            let _scope = crate::perf::scope("highlight.rules.compile");
            Arc::new(Self::new(rules::MERMAID_RULES).expect("built-in mermaid rules compile"))
        }))
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// Classify `text` into non-overlapping spans.
    ///
    /// Candidates are ordered by start offset, then by rule priority. A
    /// candidate survives only if it starts at or after the end of the last
    /// kept span, so whichever match starts first claims its whole range.
    pub fn tokenize(&self, text: &str) -> TokenSequence {
        let mut candidates = Vec::new();
        for (priority, rule) in self.rules.iter().enumerate() {
            candidates.extend(
                rule.matcher
                    .find_iter(text)
                    .filter(|m| m.start() < m.end())
                    .map(|m| Candidate {
                        start: m.start(),
                        end: m.end(),
                        priority,
                    }),
            );
        }
        candidates.sort_unstable_by_key(|c| (c.start, c.priority));

        let mut spans: Vec<Span> = Vec::new();
        let mut boundary = 0;
        for candidate in candidates {
            if candidate.start < boundary {
                continue;
            }
            boundary = candidate.end;
            spans.push(Span {
                start: candidate.start,
                end: candidate.end,
                category: self.rules[candidate.priority].category,
                text: text[candidate.start..candidate.end].to_string(),
            });
        }

        TokenSequence {
            spans,
            source_len: text.len(),
        }
    }

    /// Tokenize and serialize `text` to escaped markup.
    pub fn render(&self, text: &str) -> String {
        self.tokenize(text).to_markup(text)
    }
}

/// Tokenize with the built-in mermaid rules.
pub fn tokenize(text: &str) -> TokenSequence {
    Highlighter::mermaid().tokenize(text)
}

/// Render with the built-in mermaid rules.
pub fn render(text: &str) -> String {
    Highlighter::mermaid().render(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unescape(markup: &str) -> String {
        markup
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&")
    }

    fn classified(text: &str) -> Vec<(Category, String)> {
        tokenize(text)
            .iter()
            .map(|span| (span.category, span.text.clone()))
            .collect()
    }

    #[test]
    fn test_builtin_rules_compile_in_declared_order() {
        let categories: Vec<_> = Highlighter::mermaid()
            .rules()
            .iter()
            .map(PatternRule::category)
            .collect();
        assert_eq!(categories, Category::ALL);
    }

    #[test]
    fn test_flowchart_line_classification() {
        let tokens = classified("graph TD\n  A[Start] --> B");
        assert_eq!(
            tokens,
            vec![
                (Category::Keyword, "graph".to_string()),
                (Category::Direction, "TD".to_string()),
                (Category::Label, "[Start]".to_string()),
                (Category::Arrow, "-->".to_string()),
            ]
        );
    }

    #[test]
    fn test_flowchart_line_markup() {
        assert_eq!(
            render("graph TD\n  A[Start] --> B"),
            "<span class=\"hl-keyword\">graph</span> <span class=\"hl-direction\">TD</span>\n  \
             A<span class=\"hl-label\">[Start]</span> <span class=\"hl-arrow\">--&gt;</span> B"
        );
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        let tokens = tokenize("");
        assert!(tokens.is_empty());
        assert_eq!(tokens.source_len(), 0);
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_plain_text_is_only_escaped() {
        assert_eq!(render("x < y & z"), "x &lt; y &amp; z");
    }

    #[test]
    fn test_comment_runs_to_end_of_line() {
        let tokens = classified("%% note here --> x\ngraph");
        assert_eq!(tokens[0], (Category::Comment, "%% note here --> x".to_string()));
        assert_eq!(tokens[1], (Category::Keyword, "graph".to_string()));
    }

    #[test]
    fn test_comment_excludes_carriage_return() {
        let tokens = tokenize("%% hi\r\nA");
        assert_eq!(tokens.spans()[0].text, "%% hi");
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        assert!(tokenize("graphic").is_empty());
        assert!(tokenize("pies").is_empty());
    }

    #[test]
    fn test_keyword_after_non_ascii_letter_uses_ascii_boundary() {
        let tokens = tokenize("égraph TD");
        let spans = tokens.spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].category, Category::Keyword);
        assert_eq!((spans[0].start, spans[0].end), (2, 7));
        assert_eq!(spans[0].text, "graph");
        assert_eq!(spans[1].category, Category::Direction);
    }

    #[test]
    fn test_state_diagram_v2_matches_shorter_alternative_first() {
        let tokens = classified("stateDiagram-v2");
        assert_eq!(tokens[0], (Category::Keyword, "stateDiagram".to_string()));
    }

    #[test]
    fn test_longest_declared_arrow_wins_within_alternation() {
        assert_eq!(classified("A ==> B")[0], (Category::Arrow, "==>".to_string()));
        assert_eq!(classified("A -.-> B")[0], (Category::Arrow, "-.->".to_string()));
        assert_eq!(classified("A <--> B")[0], (Category::Arrow, "<-->".to_string()));
    }

    #[test]
    fn test_decision_braces() {
        let tokens = classified("B{Is it sunny?}");
        assert_eq!(tokens, vec![(Category::Decision, "{Is it sunny?}".to_string())]);
    }

    #[test]
    fn test_earlier_start_claims_range_over_later_string() {
        // The label starts at `[` and swallows the quoted string and arrow.
        let tokens = classified(r#"A["x --> y"]"#);
        assert_eq!(tokens, vec![(Category::Label, r#"["x --> y"]"#.to_string())]);
    }

    #[test]
    fn test_string_claims_brackets_inside_it() {
        let tokens = classified(r#"note "see [docs]""#);
        assert_eq!(
            tokens,
            vec![
                (Category::Control, "note".to_string()),
                (Category::String, r#""see [docs]""#.to_string()),
            ]
        );
    }

    #[test]
    fn test_equal_start_prefers_earlier_rule() {
        let highlighter =
            Highlighter::new(&[("ab", Category::Keyword), ("abc", Category::Label)]).unwrap();
        let tokens = highlighter.tokenize("abc");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens.spans()[0].category, Category::Keyword);
        assert_eq!(tokens.spans()[0].text, "ab");

        let reversed =
            Highlighter::new(&[("abc", Category::Label), ("ab", Category::Keyword)]).unwrap();
        let tokens = reversed.tokenize("abc");
        assert_eq!(tokens.spans()[0].category, Category::Label);
        assert_eq!(tokens.spans()[0].text, "abc");
    }

    #[test]
    fn test_zero_width_matches_are_dropped() {
        let highlighter = Highlighter::new(&[("x*", Category::Keyword)]).unwrap();
        let tokens = highlighter.tokenize("axxb");
        assert_eq!(tokens.len(), 1);
        assert_eq!((tokens.spans()[0].start, tokens.spans()[0].end), (1, 3));
    }

    #[test]
    fn test_invalid_pattern_reports_category() {
        let err = Highlighter::new(&[("(unclosed", Category::Arrow)]).unwrap_err();
        let HighlightError::InvalidPattern {
            category, pattern, ..
        } = &err;
        assert_eq!(*category, Category::Arrow);
        assert_eq!(pattern, "(unclosed");
        assert!(err.to_string().contains("invalid arrow pattern"));
    }

    #[test]
    fn test_fragments_cover_source_in_order() {
        let text = "  A --> B  ";
        let tokens = tokenize(text);
        let pieces: Vec<_> = tokens.fragments(text).collect();
        assert_eq!(
            pieces,
            vec![
                Fragment::Plain("  A "),
                Fragment::Token(&tokens.spans()[0]),
                Fragment::Plain(" B  "),
            ]
        );
    }

    #[test]
    fn test_spans_serialize_with_lowercase_labels() {
        let json = serde_json::to_string(&tokenize("LR")).unwrap();
        assert_eq!(
            json,
            r#"{"spans":[{"start":0,"end":2,"category":"direction","text":"LR"}],"source_len":2}"#
        );
    }

    #[test]
    fn test_multibyte_offsets_stay_on_char_boundaries() {
        let text = "é[ünïcode] --> ☃";
        for span in &tokenize(text) {
            assert!(text.is_char_boundary(span.start));
            assert!(text.is_char_boundary(span.end));
            assert_eq!(&text[span.start..span.end], span.text);
        }
    }

    proptest! {
        #[test]
        fn prop_render_is_deterministic(text in ".{0,200}") {
            prop_assert_eq!(render(&text), render(&text));
        }

        #[test]
        fn prop_fragments_reconstruct_source(text in r#"[a-zA-Z0-9 \n%"\[\]{}<>&=.|ox-]{0,200}"#) {
            let tokens = tokenize(&text);
            let rebuilt: String = tokens
                .fragments(&text)
                .map(|fragment| match fragment {
                    Fragment::Plain(plain) => plain,
                    Fragment::Token(span) => span.text.as_str(),
                })
                .collect();
            prop_assert_eq!(rebuilt, text);
        }

        #[test]
        fn prop_markup_round_trips_after_unescape(text in ".{0,200}") {
            let markup = render(&text);
            let mut stripped = markup.clone();
            for category in Category::ALL {
                let open = format!("<span class=\"{}\">", category.css_class());
                stripped = stripped.replace(&open, "");
            }
            stripped = stripped.replace("</span>", "");
            prop_assert!(!stripped.contains('<'));
            prop_assert!(!stripped.contains('>'));
            prop_assert_eq!(unescape(&stripped), text);
        }

        #[test]
        fn prop_spans_are_sorted_disjoint_and_exact(text in r#"[a-zA-Z \n%"\[\]{}<>=.-]{0,200}"#) {
            let tokens = tokenize(&text);
            let mut boundary = 0;
            for span in &tokens {
                prop_assert!(span.start < span.end);
                prop_assert!(span.start >= boundary);
                prop_assert_eq!(&text[span.start..span.end], span.text.as_str());
                prop_assert!(Category::ALL.contains(&span.category));
                boundary = span.end;
            }
        }
    }
}
