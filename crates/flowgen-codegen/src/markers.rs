//! Source markers and source-map extraction.
//!
//! When a pass is traceable, every emitted node statement and member
//! declaration is wrapped in a begin/end comment pair carrying the same id:
//!
//! ```text
//! /*#<n12*/counter += 1;/*#>n12*/
//! ```
//!
//! `n` marks node ids, `d` declaration ids. [`extract_source_map`] strips all
//! markers in one pass and returns the clean text plus one span per pair.
//! Pairs with the same id may nest; a per-id stack matches each end marker
//! with the most recent open one.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use flowgen_core::id::{DeclId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CodegenError;

const OPEN: &str = "/*#<";
const CLOSE: &str = "/*#>";
const END: &str = "*/";

/// What a marker pair points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkerId {
    Node(NodeId),
    Decl(DeclId),
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerId::Node(id) => write!(f, "n{}", id.0),
            MarkerId::Decl(id) => write!(f, "d{}", id.0),
        }
    }
}

impl FromStr for MarkerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let kind = chars.next();
        let value: u32 = chars
            .as_str()
            .parse()
            .map_err(|_| format!("invalid marker id `{s}`"))?;
        match kind {
            Some('n') => Ok(MarkerId::Node(NodeId(value))),
            Some('d') => Ok(MarkerId::Decl(DeclId(value))),
            _ => Err(format!("unknown marker kind in `{s}`")),
        }
    }
}

impl Serialize for MarkerId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MarkerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Wraps `text` in a begin/end marker pair.
pub fn wrap(id: MarkerId, text: &str) -> String {
    format!("{OPEN}{id}{END}{text}{CLOSE}{id}{END}")
}

/// One recovered span. Lines and columns are 1-based; the end position is
/// the character just past the span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub id: MarkerId,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

/// Spans of one generated file, ordered by start position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    pub spans: Vec<SourceSpan>,
}

impl SourceMap {
    /// Spans recorded for `id`.
    pub fn spans_for(&self, id: MarkerId) -> impl Iterator<Item = &SourceSpan> {
        self.spans.iter().filter(move |s| s.id == id)
    }

    /// The innermost span containing the given position.
    pub fn span_at(&self, line: usize, column: usize) -> Option<&SourceSpan> {
        self.spans
            .iter()
            .filter(|s| {
                (s.start_line, s.start_column) <= (line, column)
                    && (line, column) < (s.end_line, s.end_column)
            })
            .last()
    }
}

/// Strips every marker from `text`, returning the clean text and the spans
/// the marker pairs delimited.
pub fn extract_source_map(text: &str) -> Result<(String, SourceMap), CodegenError> {
    let mut clean = String::with_capacity(text.len());
    let mut open: HashMap<MarkerId, Vec<(usize, usize)>> = HashMap::new();
    let mut spans = Vec::new();
    let (mut line, mut column) = (1usize, 1usize);
    let mut rest = text;

    while !rest.is_empty() {
        let opening = rest.starts_with(OPEN);
        if opening || rest.starts_with(CLOSE) {
            let after = &rest[OPEN.len()..];
            let Some(end) = after.find(END) else {
                return Err(malformed(line, column, "unterminated marker"));
            };
            let id: MarkerId = after[..end]
                .parse()
                .map_err(|reason: String| malformed(line, column, &reason))?;
            if opening {
                open.entry(id).or_default().push((line, column));
            } else {
                let Some((start_line, start_column)) = open.get_mut(&id).and_then(Vec::pop) else {
                    return Err(malformed(line, column, &format!("end marker {id} without begin")));
                };
                spans.push(SourceSpan {
                    id,
                    start_line,
                    start_column,
                    end_line: line,
                    end_column: column,
                });
            }
            rest = &after[end + END.len()..];
            continue;
        }

        let mut chars = rest.chars();
        let Some(c) = chars.next() else { break };
        clean.push(c);
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
        rest = chars.as_str();
    }

    if let Some((id, positions)) = open.iter().find(|(_, p)| !p.is_empty()) {
        let (l, c) = positions[positions.len() - 1];
        return Err(malformed(l, c, &format!("begin marker {id} without end")));
    }

    spans.sort_by(|a, b| {
        (a.start_line, a.start_column, b.end_line, b.end_column)
            .cmp(&(b.start_line, b.start_column, a.end_line, a.end_column))
    });
    Ok((clean, SourceMap { spans }))
}

/// Drops every marker token without checking that they pair up. Used on
/// fragments that may hold only one half of a pair.
pub fn strip_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("/*#") {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(OPEN) || tail.starts_with(CLOSE) {
            match tail[OPEN.len()..].find(END) {
                Some(end) => rest = &tail[OPEN.len() + end + END.len()..],
                None => {
                    out.push_str(tail);
                    rest = "";
                }
            }
        } else {
            out.push_str("/*#");
            rest = &tail[3..];
        }
    }
    out.push_str(rest);
    out
}

fn malformed(line: usize, column: usize, reason: &str) -> CodegenError {
    CodegenError::MalformedMarker {
        line,
        column,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn n(id: u32) -> MarkerId {
        MarkerId::Node(NodeId(id))
    }

    #[test]
    fn single_pair() {
        let text = format!("a\n  {}\nb", wrap(n(12), "x = 1;"));
        let (clean, map) = extract_source_map(&text).unwrap();
        assert_eq!(clean, "a\n  x = 1;\nb");
        assert_eq!(
            map.spans,
            vec![SourceSpan {
                id: n(12),
                start_line: 2,
                start_column: 3,
                end_line: 2,
                end_column: 9,
            }]
        );
    }

    #[test]
    fn nested_same_id() {
        let inner = wrap(n(1), "b");
        let text = wrap(n(1), &format!("a{inner}c"));
        let (clean, map) = extract_source_map(&text).unwrap();
        assert_eq!(clean, "abc");
        assert_eq!(map.spans.len(), 2);
        // Outer span first.
        assert_eq!((map.spans[0].start_column, map.spans[0].end_column), (1, 4));
        assert_eq!((map.spans[1].start_column, map.spans[1].end_column), (2, 3));
        assert_eq!(map.span_at(1, 2).map(|s| s.end_column), Some(3));
    }

    #[test]
    fn multiline_span() {
        let text = wrap(MarkerId::Decl(DeclId(3)), "void F() {\n}\n");
        let (_, map) = extract_source_map(&text).unwrap();
        let span = &map.spans[0];
        assert_eq!((span.start_line, span.end_line, span.end_column), (1, 3, 1));
    }

    #[test]
    fn unmatched_markers_are_errors() {
        assert!(matches!(
            extract_source_map("/*#>n1*/"),
            Err(CodegenError::MalformedMarker { .. })
        ));
        assert!(matches!(
            extract_source_map("x/*#<n1*/y"),
            Err(CodegenError::MalformedMarker { line: 1, column: 2, .. })
        ));
        assert!(matches!(
            extract_source_map("/*#<q1*/"),
            Err(CodegenError::MalformedMarker { .. })
        ));
        assert!(matches!(
            extract_source_map("/*#<n1"),
            Err(CodegenError::MalformedMarker { .. })
        ));
    }

    #[test]
    fn strip_tokens_tolerates_half_pairs() {
        assert_eq!(strip_tokens("/*#<n1*/return;"), "return;");
        assert_eq!(strip_tokens("a/*#>d2*/b"), "ab");
        assert_eq!(strip_tokens("/* plain */"), "/* plain */");
    }

    #[test]
    fn marker_id_serializes_as_text() {
        assert_eq!(serde_json::to_string(&n(7)).unwrap(), "\"n7\"");
        let back: MarkerId = serde_json::from_str("\"d2\"").unwrap();
        assert_eq!(back, MarkerId::Decl(DeclId(2)));
    }

    #[derive(Debug, Clone)]
    enum Tree {
        Text(String),
        Marked(u32, Vec<Tree>),
    }

    fn arb_tree() -> impl Strategy<Value = Tree> {
        let leaf = "[a-z ;{}\n]{0,8}".prop_map(Tree::Text);
        leaf.prop_recursive(4, 24, 4, |inner| {
            (0u32..5, prop::collection::vec(inner, 0..4)).prop_map(|(id, kids)| Tree::Marked(id, kids))
        })
    }

    fn render(tree: &Tree, ids: &mut Vec<u32>) -> String {
        match tree {
            Tree::Text(t) => t.clone(),
            Tree::Marked(id, kids) => {
                ids.push(*id);
                let body: String = kids.iter().map(|k| render(k, ids)).collect();
                wrap(n(*id), &body)
            }
        }
    }

    proptest! {
        #[test]
        fn round_trip_strips_every_marker(tree in arb_tree()) {
            let mut ids = Vec::new();
            let text = render(&tree, &mut ids);
            let (clean, map) = extract_source_map(&text).unwrap();
            prop_assert!(!clean.contains("/*#"));
            prop_assert_eq!(map.spans.len(), ids.len());
            for span in &map.spans {
                match span.id {
                    MarkerId::Node(NodeId(id)) => prop_assert!(ids.contains(&id)),
                    MarkerId::Decl(_) => prop_assert!(false),
                }
            }
        }
    }
}
