//! Built-in rule set for mermaid diagram source.

use super::Category;

/// Rules in priority order. Index 0 wins ties.
pub(super) const MERMAID_RULES: &[(&str, Category)] = &[
    // `%%` comments run to the end of the line; `\r` stays outside the span.
    (r"%%[^\r\n]*", Category::Comment),
    // Word boundaries are ASCII-only: a keyword glued to `é` still counts.
    (
        r"(?-u:\b)(?:graph|flowchart|sequenceDiagram|classDiagram|stateDiagram|stateDiagram-v2|erDiagram|gantt|pie|gitGraph|journey|quadrantChart|requirementDiagram|C4Context|mindmap|timeline|zenuml|sankey-beta)(?-u:\b)",
        Category::Keyword,
    ),
    (r"(?-u:\b)(?:TD|TB|BT|RL|LR)(?-u:\b)", Category::Direction),
    (
        r"(?-u:\b)(?:subgraph|end|if|else|loop|alt|opt|par|and|rect|note|activate|deactivate|class|click|callback|link|title|section|participant|actor|as)(?-u:\b)",
        Category::Control,
    ),
    // Alternation is leftmost-first, so longer arrows must come before their prefixes.
    (
        r"-->|---|-\.->|\.\.-|===>|==>|--o|--x|-\.-|<-->|<->|o--o|x--x|\|\||--|->",
        Category::Arrow,
    ),
    (r#""[^"]*""#, Category::String),
    (r"\[[^\]]+\]", Category::Label),
    (r"\{[^}]+\}", Category::Decision),
];
