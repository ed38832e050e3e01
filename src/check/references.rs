//! Reference validation for `next`, `on_error` and `interrupt`

use crate::domain::{Issue, IssueCode, NodeRegistry, RefField, RefKind};

/// Checks every reference field of every canonical node
pub fn check_references(registry: &NodeRegistry) -> Vec<Issue> {
    let mut issues = Vec::new();

    for node in registry.nodes() {
        for field in RefField::ALL {
            if !node.has(field) {
                continue;
            }

            let located = |issue: Issue| {
                issue
                    .in_file(node.file())
                    .at_node(node.name())
                    .at_field(field.as_str())
            };

            let extraction = node.refs(field);
            for problem in extraction.problems {
                issues.push(located(Issue::error(
                    IssueCode::InvalidRefShape,
                    problem.to_string(),
                )));
            }

            for r in extraction.refs {
                if r.is_blank() {
                    issues.push(located(Issue::error(
                        IssueCode::InvalidRef,
                        format!("reference has an empty name: {}", r.raw),
                    )));
                    continue;
                }

                match r.kind {
                    RefKind::Node if !registry.contains(&r.name) => {
                        issues.push(located(Issue::error(
                            IssueCode::DanglingNodeRef,
                            format!("references unknown node: {}", r.name),
                        )));
                    }
                    RefKind::Anchor if !registry.has_anchor(&r.name) => {
                        issues.push(located(Issue::error(
                            IssueCode::DanglingAnchorRef,
                            format!("references undeclared anchor: {}", r.name),
                        )));
                    }
                    _ => {}
                }
            }
        }
    }

    issues
}
