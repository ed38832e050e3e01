//! Flow graph for pipeline nodes
//!
//! Edges follow node-kind references in `next` and `on_error`. Anchor
//! references and the legacy `interrupt` field add no edges, so dead nodes
//! kept alive only through them still show up as unreachable.
//! Uses petgraph for graph operations.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

use super::reference::RefField;
use super::registry::NodeRegistry;

/// A directed graph of node-to-successor edges
#[derive(Debug, Default)]
pub struct FlowGraph {
    /// The underlying directed graph
    graph: DiGraph<String, RefField>,

    /// Map from node name to node index
    node_map: HashMap<String, NodeIndex>,
}

impl FlowGraph {
    /// Creates an empty flow graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds the graph from canonical node definitions
    ///
    /// References to unknown names are skipped here; they are reported as
    /// dangling by the reference check.
    pub fn from_registry(registry: &NodeRegistry) -> Self {
        let mut graph = Self::new();

        // First pass: add all nodes
        for name in registry.names() {
            graph.add_node(name);
        }

        // Second pass: add all edges
        for node in registry.nodes() {
            for field in RefField::ALL.into_iter().filter(RefField::is_flow) {
                for r in node.refs(field).refs {
                    if r.is_node() {
                        graph.add_edge(node.name(), &r.name, field);
                    }
                }
            }
        }

        graph
    }

    /// Adds a node to the graph
    pub fn add_node(&mut self, name: &str) {
        if !self.node_map.contains_key(name) {
            let idx = self.graph.add_node(name.to_string());
            self.node_map.insert(name.to_string(), idx);
        }
    }

    /// Adds an edge `from -> to`; returns false if either end is unknown
    ///
    /// Repeated edges between the same pair are collapsed.
    pub fn add_edge(&mut self, from: &str, to: &str, field: RefField) -> bool {
        let (Some(&from_idx), Some(&to_idx)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return false;
        };

        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, field);
        }
        true
    }

    /// Returns the direct successors of a node
    pub fn successors(&self, name: &str) -> Vec<&str> {
        let idx = match self.node_map.get(name) {
            Some(idx) => *idx,
            None => return vec![],
        };

        self.graph
            .neighbors_directed(idx, petgraph::Direction::Outgoing)
            .filter_map(|idx| self.graph.node_weight(idx).map(String::as_str))
            .collect()
    }

    /// Returns every node reachable from any of the entries
    ///
    /// Entries that are not in the graph are ignored.
    pub fn reachable_from<'a>(&self, entries: impl IntoIterator<Item = &'a str>) -> HashSet<&str> {
        let mut starts = entries
            .into_iter()
            .filter_map(|name| self.node_map.get(name).copied());

        let mut seen = HashSet::new();
        let Some(first) = starts.next() else {
            return seen;
        };

        // One walker shares its discovered set across all roots
        let mut dfs = Dfs::new(&self.graph, first);
        loop {
            while let Some(idx) = dfs.next(&self.graph) {
                if let Some(name) = self.graph.node_weight(idx) {
                    seen.insert(name.as_str());
                }
            }
            match starts.next() {
                Some(idx) => dfs.move_to(idx),
                None => break,
            }
        }

        seen
    }

    /// Returns nodes not reachable from the entries, sorted by name
    pub fn unreachable_from<'a>(&self, entries: impl IntoIterator<Item = &'a str>) -> Vec<&str> {
        let reachable = self.reachable_from(entries);
        let mut dead: Vec<&str> = self
            .node_map
            .keys()
            .map(String::as_str)
            .filter(|name| !reachable.contains(name))
            .collect();
        dead.sort_unstable();
        dead
    }

    /// Returns true if the graph contains the node
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Returns the number of nodes in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
