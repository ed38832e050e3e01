//! Cross-checks between the interface document and the node set

use crate::domain::{Issue, IssueCode, NodeRegistry};
use crate::storage::Interface;

/// Reports task entries and override keys that name no node
pub fn check_interface(registry: &NodeRegistry, interface: &Interface) -> Vec<Issue> {
    let mut issues = Vec::new();

    for entry in &interface.entries {
        if !registry.contains(entry) {
            issues.push(
                Issue::error(
                    IssueCode::TaskEntryMissing,
                    format!("task entry points to unknown node: {}", entry),
                )
                .in_file(&interface.path),
            );
        }
    }

    for key in &interface.override_keys {
        if !registry.contains(key) {
            issues.push(
                Issue::warn(
                    IssueCode::PipelineOverrideUnknown,
                    format!("pipeline_override targets unknown node: {}", key),
                )
                .in_file(&interface.path),
            );
        }
    }

    issues
}
