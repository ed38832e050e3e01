//! # Analysis Engine
//!
//! [`Analysis`] is the per-run context: it owns the merged
//! [`NodeRegistry`] and the [`Report`] every phase appends to. A run is
//! built fresh for each invocation, so phases can be exercised in isolation.
//!
//! ## Phases
//!
//! | Phase | Method | Findings |
//! |-------|--------|----------|
//! | Load | [`Analysis::scan`] / [`Analysis::from_files`] | parse errors, duplicate keys, structure |
//! | Registry | (part of load) | duplicate node names |
//! | References | [`Analysis::check_references`] | shape errors, dangling node/anchor refs |
//! | Resources | [`Analysis::check_resources`] | missing template images |
//! | Interface | [`Analysis::check_interface`] | unknown task entries and overrides |
//! | Reachability | [`Analysis::check_reachability`] | nodes no entry reaches |
//! | Priority | [`Analysis::check_priority`] | `next` lists out of priority order |

mod interface;
mod references;
mod resources;

use std::path::Path;

use anyhow::Result;

use crate::domain::{FlowGraph, Issue, IssueCode, NodeRegistry, Report, RuleSet, Stats};
use crate::storage::{find_pipeline_files, load_all, Interface, LoadedFile, ScanMode};

pub use interface::check_interface;
pub use references::check_references;
pub use resources::check_templates;

/// State of one analysis run
#[derive(Debug)]
pub struct Analysis {
    registry: NodeRegistry,
    report: Report,
    files: usize,
}

impl Analysis {
    /// Discovers and loads the pipeline directory
    ///
    /// A missing directory or one without `*.json` files yields a fatal
    /// analysis; later phases do nothing on it.
    pub fn scan(dir: &Path, mode: ScanMode, metadata_prefix: &str) -> Result<Self> {
        if !dir.exists() {
            return Ok(Self::fatal(
                Issue::error(IssueCode::PipelineDirNotFound, "pipeline directory does not exist")
                    .in_file(dir),
                metadata_prefix,
            ));
        }

        let paths = find_pipeline_files(dir, mode)?;
        if paths.is_empty() {
            return Ok(Self::fatal(
                Issue::error(IssueCode::PipelineEmpty, "pipeline directory contains no .json files")
                    .in_file(dir),
                metadata_prefix,
            ));
        }

        Ok(Self::from_files(load_all(&paths), metadata_prefix))
    }

    fn fatal(issue: Issue, metadata_prefix: &str) -> Self {
        Self {
            registry: NodeRegistry::new(metadata_prefix),
            report: Report::fatal(issue),
            files: 0,
        }
    }

    /// Merges loaded files into a fresh registry, in the given order
    pub fn from_files(files: Vec<LoadedFile>, metadata_prefix: &str) -> Self {
        let mut registry = NodeRegistry::new(metadata_prefix);
        let mut report = Report::new();
        let count = files.len();

        for file in files {
            let parsed = match file.result {
                Ok(parsed) => parsed,
                Err(e) => {
                    report.push(
                        Issue::error(IssueCode::PipelineJsonInvalid, e.to_string()).in_file(&file.path),
                    );
                    continue;
                }
            };

            let repeated = parsed.unique_duplicates();
            if !repeated.is_empty() {
                report.push(
                    Issue::error(
                        IssueCode::DuplicateJsonKey,
                        format!("repeated keys in file: {}", repeated.join(", ")),
                    )
                    .in_file(&file.path),
                );
            }

            report.extend(registry.ingest(&file.path, &parsed.value));
        }

        report.extend(registry.duplicate_issues());

        Self {
            registry,
            report,
            files: count,
        }
    }

    /// Returns true if setup failed and analysis must stop
    pub fn is_fatal(&self) -> bool {
        self.report.is_fatal()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Number of pipeline files that were read
    pub fn files(&self) -> usize {
        self.files
    }

    /// Fails the run when no node was registered at all
    pub fn require_nodes(&mut self) {
        if !self.is_fatal() && self.registry.is_empty() {
            self.report
                .push(Issue::error(IssueCode::NoNodes, "no pipeline nodes found"));
            self.report.mark_fatal();
        }
    }

    pub fn check_references(&mut self) {
        if self.is_fatal() {
            return;
        }
        self.report.extend(check_references(&self.registry));
    }

    pub fn check_resources(&mut self, image_dir: &Path) {
        if self.is_fatal() {
            return;
        }
        self.report.extend(check_templates(&self.registry, image_dir));
    }

    /// Reads the interface document, recording a warning if it is unusable
    ///
    /// Returns `None` when the file does not exist or cannot be parsed.
    pub fn read_interface(&mut self, path: &Path) -> Option<Interface> {
        if !path.exists() {
            return None;
        }

        match Interface::load(path) {
            Ok(interface) => Some(interface),
            Err(e) => {
                self.report.push(
                    Issue::warn(IssueCode::InterfaceParseFailed, e.to_string()).in_file(path),
                );
                None
            }
        }
    }

    pub fn check_interface(&mut self, interface: &Interface) {
        if self.is_fatal() {
            return;
        }
        self.report.extend(check_interface(&self.registry, interface));
    }

    /// Builds the flow graph from canonical nodes
    pub fn flow_graph(&self) -> FlowGraph {
        FlowGraph::from_registry(&self.registry)
    }

    /// Warns about every node the entries cannot reach
    pub fn check_reachability(&mut self, graph: &FlowGraph, entries: &[String]) {
        if self.is_fatal() {
            return;
        }

        if entries.is_empty() {
            self.report.push(Issue::info(
                IssueCode::ReachabilitySkipped,
                "no task entry points declared; unreachable-node check skipped",
            ));
            return;
        }

        for name in graph.unreachable_from(entries.iter().map(String::as_str)) {
            let mut issue = Issue::warn(
                IssueCode::UnreachableNode,
                "node is not reachable from any task entry (possibly leftover)",
            )
            .at_node(name);
            if let Some(node) = self.registry.get(name) {
                issue = issue.in_file(node.file());
            }
            self.report.push(issue);
        }
    }

    pub fn check_priority(&mut self, rules: &RuleSet) {
        if self.is_fatal() {
            return;
        }
        self.report.extend(
            rules
                .check_all(&self.registry)
                .into_iter()
                .map(|v| v.into_issue()),
        );
    }

    /// Closes the run and returns the report with input statistics
    pub fn finish(self) -> Report {
        let mut report = self.report;
        report.set_stats(Stats {
            files: self.files,
            nodes: self.registry.len(),
            anchors: self.registry.anchors().len(),
            disabled: self.registry.disabled_count(),
        });
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrioritySettings, EXIT_ENVIRONMENT, EXIT_FAILED, EXIT_OK};
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn scan(dir: &Path) -> Analysis {
        Analysis::scan(dir, ScanMode::Flat, "$").unwrap()
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut analysis = scan(&dir.path().join("missing"));
        analysis.check_references();

        let report = analysis.finish();
        assert_eq!(report.exit_code(false), EXIT_ENVIRONMENT);
        assert_eq!(report.issues().len(), 1);
        assert_eq!(report.issues()[0].code, IssueCode::PipelineDirNotFound);
    }

    #[test]
    fn empty_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "readme.txt", "not a pipeline");

        let analysis = scan(dir.path());
        assert!(analysis.is_fatal());
        let report = analysis.finish();
        assert_eq!(report.exit_code(false), EXIT_ENVIRONMENT);
        assert_eq!(report.issues()[0].code, IssueCode::PipelineEmpty);
        assert_eq!(report.stats().files, 0);
    }

    #[test]
    fn parse_failure_does_not_stop_other_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", "{ not json");
        write(dir.path(), "b.json", r#"{"B": {"next": "Ghost"}}"#);

        let mut analysis = scan(dir.path());
        analysis.check_references();
        let report = analysis.finish();

        assert_eq!(report.with_code(IssueCode::PipelineJsonInvalid).count(), 1);
        assert_eq!(report.with_code(IssueCode::DanglingNodeRef).count(), 1);
        assert_eq!(report.stats().files, 2);
        assert_eq!(report.stats().nodes, 1);
        assert_eq!(report.exit_code(false), EXIT_FAILED);
    }

    #[test]
    fn duplicate_json_keys_reported_once_per_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"A": {}, "B": {}, "A": {}, "B": {}}"#);

        let report = scan(dir.path()).finish();
        let dups: Vec<_> = report.with_code(IssueCode::DuplicateJsonKey).collect();
        assert_eq!(dups.len(), 1);
        assert!(dups[0].message.ends_with("A, B"));
    }

    #[test]
    fn duplicate_node_across_files_still_analyzed() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"X": {"next": "Y"}, "Y": {}}"#);
        write(dir.path(), "b.json", r#"{"X": {"next": "Ghost"}}"#);

        let mut analysis = scan(dir.path());
        analysis.check_references();
        let report = analysis.finish();

        let dups: Vec<_> = report.with_code(IssueCode::DuplicateNodeName).collect();
        assert_eq!(dups.len(), 1);
        assert!(dups[0].message.contains("a.json"));
        assert!(dups[0].message.contains("b.json"));
        // First definition is used, so its valid reference is what gets checked
        assert_eq!(report.with_code(IssueCode::DanglingNodeRef).count(), 0);
    }

    #[test]
    fn cycle_between_files_is_clean() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"Start": {"next": ["B"]}}"#);
        write(dir.path(), "b.json", r#"{"B": {"next": ["Start"]}}"#);

        let mut analysis = scan(dir.path());
        analysis.check_references();
        analysis.check_resources(&dir.path().join("no-images"));
        let graph = analysis.flow_graph();
        analysis.check_reachability(&graph, &["Start".to_string()]);
        analysis.check_priority(&RuleSet::with_defaults(&PrioritySettings::default()));
        let report = analysis.finish();

        let counts = report.counts();
        assert_eq!(counts.errors, 0);
        assert_eq!(counts.warnings, 0);
        assert_eq!(report.exit_code(true), EXIT_OK);
    }

    #[test]
    fn reachability_flags_orphans_only() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"Start": {"next": ["Mid"]}, "Mid": {"next": ["End"]}, "End": {}, "Orphan": {}}"#,
        );

        let mut analysis = scan(dir.path());
        let graph = analysis.flow_graph();
        analysis.check_reachability(&graph, &["Start".to_string()]);
        let report = analysis.finish();

        let dead: Vec<_> = report
            .with_code(IssueCode::UnreachableNode)
            .map(|i| i.node.as_deref().unwrap())
            .collect();
        assert_eq!(dead, vec!["Orphan"]);
        assert!(report.issues()[0].file.is_some());
    }

    #[test]
    fn reachability_without_entries_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"Start": {}, "Orphan": {}}"#);

        let mut analysis = scan(dir.path());
        let graph = analysis.flow_graph();
        analysis.check_reachability(&graph, &[]);
        let report = analysis.finish();

        assert_eq!(report.with_code(IssueCode::UnreachableNode).count(), 0);
        assert_eq!(report.with_code(IssueCode::ReachabilitySkipped).count(), 1);
        assert_eq!(report.exit_code(true), EXIT_OK);
    }

    #[test]
    fn require_nodes_fails_on_metadata_only_input() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"$schema": "pipeline.schema.json"}"#);

        let mut analysis = scan(dir.path());
        analysis.require_nodes();
        let report = analysis.finish();

        assert_eq!(report.exit_code(false), EXIT_ENVIRONMENT);
        assert_eq!(report.with_code(IssueCode::NoNodes).count(), 1);
    }

    #[test]
    fn unreadable_interface_is_a_warning() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"A": {}}"#);
        let interface = dir.path().join("interface.json");
        fs::write(&interface, "{ \"task\": [ }").unwrap();

        let mut analysis = scan(dir.path());
        assert!(analysis.read_interface(&interface).is_none());
        assert!(analysis.read_interface(&dir.path().join("absent.json")).is_none());

        let report = analysis.finish();
        assert_eq!(report.with_code(IssueCode::InterfaceParseFailed).count(), 1);
    }

    #[test]
    fn stats_are_filled_in() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "a.json",
            r#"{"A": {"anchor": ["Home"], "enabled": false}, "B": {}}"#,
        );

        let stats = scan(dir.path()).finish().stats();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.anchors, 1);
        assert_eq!(stats.disabled, 1);
    }
}
