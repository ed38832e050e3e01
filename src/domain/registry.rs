//! Merged node namespace
//!
//! Pipeline files are ingested one at a time, in sorted path order. The first
//! definition of a name becomes canonical; later ones are only recorded so
//! cross-file duplicates can be reported.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use super::issue::{Issue, IssueCode};
use super::node::Node;

/// Keys starting with this prefix are editor/tool metadata, not nodes
pub const DEFAULT_METADATA_PREFIX: &str = "$";

/// All nodes and anchors known to one analysis run
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    metadata_prefix: String,

    /// Canonical definitions in first-seen order
    nodes: IndexMap<String, Node>,

    /// Every file each name was defined in
    occurrences: IndexMap<String, Vec<PathBuf>>,

    anchors: BTreeSet<String>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_METADATA_PREFIX)
    }
}

impl NodeRegistry {
    pub fn new(metadata_prefix: impl Into<String>) -> Self {
        Self {
            metadata_prefix: metadata_prefix.into(),
            nodes: IndexMap::new(),
            occurrences: IndexMap::new(),
            anchors: BTreeSet::new(),
        }
    }

    /// Registers every node of one parsed file
    pub fn ingest(&mut self, file: &Path, root: &Value) -> Vec<Issue> {
        let mut issues = Vec::new();

        let Some(entries) = root.as_object() else {
            issues.push(
                Issue::error(
                    IssueCode::PipelineRootNotObject,
                    format!(
                        "top level must be a JSON object mapping node name to node, found {}",
                        type_name(root)
                    ),
                )
                .in_file(file),
            );
            return issues;
        };

        for (name, value) in entries {
            if self.is_metadata(name) {
                continue;
            }
            if name.trim().is_empty() {
                issues.push(
                    Issue::error(IssueCode::InvalidNodeName, "node name must be a non-empty string")
                        .in_file(file),
                );
                continue;
            }

            let files = self.occurrences.entry(name.clone()).or_default();
            if !files.iter().any(|f| f == file) {
                files.push(file.to_path_buf());
            }

            if !value.is_object() {
                issues.push(
                    Issue::error(
                        IssueCode::NodeNotObject,
                        format!("node value must be a JSON object, found {}", type_name(value)),
                    )
                    .in_file(file)
                    .at_node(name),
                );
            }

            let node = Node::new(name.clone(), file, value.clone());
            for anchor in node.declared_anchors() {
                self.anchors.insert(anchor.to_string());
            }

            self.nodes.entry(name.clone()).or_insert(node);
        }

        issues
    }

    /// One issue per name defined in more than one file
    pub fn duplicate_issues(&self) -> Vec<Issue> {
        let mut duplicated: Vec<_> = self
            .occurrences
            .iter()
            .filter(|(_, files)| files.len() > 1)
            .collect();
        duplicated.sort_by(|a, b| a.0.cmp(b.0));

        duplicated
            .into_iter()
            .map(|(name, files)| {
                let listed: Vec<String> = files
                    .iter()
                    .map(|f| f.display().to_string().replace('\\', "/"))
                    .collect();
                Issue::error(
                    IssueCode::DuplicateNodeName,
                    format!(
                        "node name defined in multiple files (first one is used): {}",
                        listed.join(", ")
                    ),
                )
                .at_node(name.clone())
            })
            .collect()
    }

    fn is_metadata(&self, key: &str) -> bool {
        !self.metadata_prefix.is_empty() && key.starts_with(&self.metadata_prefix)
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Canonical nodes in first-seen order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Files a name was defined in
    pub fn occurrences(&self, name: &str) -> &[PathBuf] {
        self.occurrences
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn anchors(&self) -> &BTreeSet<String> {
        &self.anchors
    }

    pub fn has_anchor(&self, name: &str) -> bool {
        self.anchors.contains(name)
    }

    /// Number of canonical nodes with `enabled: false`
    pub fn disabled_count(&self) -> usize {
        self.nodes.values().filter(|n| !n.enabled()).count()
    }
}

/// JSON type name for messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
