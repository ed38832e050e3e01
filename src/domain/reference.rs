//! Successor references
//!
//! `next`, `on_error` and the legacy `interrupt` field accept three shapes:
//!
//! - a string, optionally prefixed with bracket tags: `"[JumpBack]Name"`,
//!   `"[Anchor]AnchorName"`
//! - an object carrying a `name`: `{"name": "Name", "jump_back": true}`,
//!   `{"name": "AnchorName", "anchor": true}`
//! - an array mixing the two (arrays may nest)
//!
//! [`extract_refs`] normalizes any of them into a flat, ordered list of
//! [`NodeRef`]s and reports malformed entries as [`ShapeProblem`]s.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

/// Namespace a reference resolves against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Node,
    Anchor,
}

/// Node fields that hold successor references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefField {
    Next,
    OnError,
    /// Deprecated alias kept for reference validation only
    Interrupt,
}

impl RefField {
    pub const ALL: [RefField; 3] = [RefField::Next, RefField::OnError, RefField::Interrupt];

    pub fn as_str(&self) -> &'static str {
        match self {
            RefField::Next => "next",
            RefField::OnError => "on_error",
            RefField::Interrupt => "interrupt",
        }
    }

    /// Returns true if edges from this field count for reachability
    pub fn is_flow(&self) -> bool {
        matches!(self, RefField::Next | RefField::OnError)
    }
}

impl fmt::Display for RefField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized reference
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRef {
    pub kind: RefKind,
    pub name: String,
    /// The entry as written
    pub raw: Value,
}

impl NodeRef {
    /// Parses the string form, stripping every leading `[Tag]`
    pub fn from_text(text: &str) -> Self {
        let (tags, name) = split_tags(text);
        let kind = if tags.iter().any(|t| t.eq_ignore_ascii_case("anchor")) {
            RefKind::Anchor
        } else {
            RefKind::Node
        };

        Self {
            kind,
            name: name.to_string(),
            raw: Value::String(text.to_string()),
        }
    }

    pub fn is_node(&self) -> bool {
        self.kind == RefKind::Node
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == RefKind::Anchor
    }

    /// Returns true if nothing is left once tags are stripped
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// Splits leading bracket tags from a reference string
///
/// A tag is `[` followed by at least one non-`]` character and a closing
/// `]`. Parsing stops at the first position that is not a tag.
pub fn split_tags(text: &str) -> (Vec<&str>, &str) {
    let mut tags = Vec::new();
    let mut rest = text;

    while let Some((tag, tail)) = split_tag(rest) {
        tags.push(tag);
        rest = tail;
    }

    (tags, rest)
}

fn split_tag(text: &str) -> Option<(&str, &str)> {
    let inner = text.strip_prefix('[')?;
    let end = inner.find(']')?;
    if end == 0 {
        return None;
    }
    Some((&inner[..end], &inner[end + 1..]))
}

/// Shape of a single reference entry
#[derive(Debug, Clone, Copy)]
pub enum RefShape<'a> {
    Absent,
    Text(&'a str),
    Attr(&'a Map<String, Value>),
    List(&'a [Value]),
    Unsupported(&'static str),
}

impl<'a> RefShape<'a> {
    pub fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => RefShape::Absent,
            Value::String(s) => RefShape::Text(s),
            Value::Object(map) => RefShape::Attr(map),
            Value::Array(items) => RefShape::List(items),
            Value::Bool(_) => RefShape::Unsupported("boolean"),
            Value::Number(_) => RefShape::Unsupported("number"),
        }
    }
}

/// A malformed entry inside a reference field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeProblem {
    /// Array indices leading to the entry, outermost first
    pub path: Vec<usize>,
    pub message: String,
}

impl fmt::Display for ShapeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        f.write_str("entry ")?;
        for idx in &self.path {
            write!(f, "[{}]", idx)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Result of normalizing one field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub refs: Vec<NodeRef>,
    pub problems: Vec<ShapeProblem>,
}

/// Normalizes a reference field into an ordered list of references
pub fn extract_refs(value: &Value) -> Extraction {
    let mut out = Extraction::default();
    let mut path = Vec::new();
    walk(value, &mut path, &mut out);
    out
}

fn walk(value: &Value, path: &mut Vec<usize>, out: &mut Extraction) {
    match RefShape::of(value) {
        RefShape::Absent => {}
        RefShape::Text(text) => out.refs.push(NodeRef::from_text(text)),
        RefShape::Attr(map) => match map.get("name") {
            Some(Value::String(name)) if !name.is_empty() => {
                let kind = if map.get("anchor") == Some(&Value::Bool(true)) {
                    RefKind::Anchor
                } else {
                    RefKind::Node
                };
                out.refs.push(NodeRef {
                    kind,
                    name: name.clone(),
                    raw: value.clone(),
                });
            }
            _ => out.problems.push(ShapeProblem {
                path: path.clone(),
                message: "reference object must carry a non-empty string field `name`".to_string(),
            }),
        },
        RefShape::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                path.push(idx);
                walk(item, path, out);
                path.pop();
            }
        }
        RefShape::Unsupported(type_name) => out.problems.push(ShapeProblem {
            path: path.clone(),
            message: format!(
                "unsupported reference type {} (expected string, object or array)",
                type_name
            ),
        }),
    }
}
