//! Pipeline node model
//!
//! A node is one top-level entry of a pipeline file. Its payload is kept as
//! raw JSON; accessors pull out the fields the analyzer cares about.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::reference::{extract_refs, Extraction, RefField};

/// Recognition type that always matches
pub const DEFAULT_UNCONDITIONAL_TYPE: &str = "DirectHit";

/// Payload of a node as found on disk
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Object(Map<String, Value>),
    /// Placeholder for a value that was not an object
    Invalid(Value),
}

/// A named node and the file that defined it
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    file: PathBuf,
    body: NodeBody,
}

impl Node {
    pub fn new(name: impl Into<String>, file: impl Into<PathBuf>, value: Value) -> Self {
        let body = match value {
            Value::Object(map) => NodeBody::Object(map),
            other => NodeBody::Invalid(other),
        };

        Self {
            name: name.into(),
            file: file.into(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File holding the canonical definition
    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// Returns true if the node value was an object
    pub fn is_valid(&self) -> bool {
        matches!(self.body, NodeBody::Object(_))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match &self.body {
            NodeBody::Object(map) => map.get(key),
            NodeBody::Invalid(_) => None,
        }
    }

    pub fn has(&self, field: RefField) -> bool {
        self.get(field.as_str()).is_some()
    }

    /// Normalized references of a successor field
    pub fn refs(&self, field: RefField) -> Extraction {
        self.get(field.as_str())
            .map(extract_refs)
            .unwrap_or_default()
    }

    /// Recognition type, from either `{"type": ..}` or the bare string form
    pub fn recognition_type(&self) -> Option<&str> {
        match self.get("recognition")? {
            Value::String(kind) => Some(kind),
            Value::Object(rec) => rec.get("type").and_then(Value::as_str),
            _ => None,
        }
    }

    /// Returns true unless the recognition type is the unconditional marker
    ///
    /// A node without recognition counts as conditional.
    pub fn is_conditional(&self, unconditional_type: &str) -> bool {
        self.recognition_type() != Some(unconditional_type)
    }

    /// Template image paths declared by the recognition parameters
    pub fn templates(&self) -> Vec<&str> {
        let declared = match self.get("recognition") {
            Some(Value::Object(rec)) => rec
                .get("param")
                .and_then(Value::as_object)
                .and_then(|param| param.get("template")),
            // Legacy layout keeps parameters next to a string recognition
            Some(Value::String(_)) => self.get("template"),
            _ => None,
        };

        strings_of(declared)
    }

    /// Anchor names declared by this node
    pub fn declared_anchors(&self) -> Vec<&str> {
        strings_of(self.get("anchor"))
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect()
    }

    /// Nodes are enabled unless `enabled` is explicitly false
    pub fn enabled(&self) -> bool {
        self.get("enabled").and_then(Value::as_bool).unwrap_or(true)
    }
}

/// Collects strings from a value that is a string or a list of them
fn strings_of(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => vec![],
    }
}
