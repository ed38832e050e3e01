//! Template image checks

use std::path::Path;

use crate::domain::{Issue, IssueCode, NodeRegistry};

const TEMPLATE_FIELD: &str = "recognition.param.template";

/// Warns about template images missing under `image_dir`
///
/// Nothing is reported when no node declares a template, so projects
/// without image recognition need no image directory.
pub fn check_templates(registry: &NodeRegistry, image_dir: &Path) -> Vec<Issue> {
    let declared: Vec<_> = registry
        .nodes()
        .flat_map(|node| node.templates().into_iter().map(move |t| (node, t)))
        .collect();

    if declared.is_empty() {
        return Vec::new();
    }

    if !image_dir.is_dir() {
        return vec![Issue::warn(
            IssueCode::ImageDirNotFound,
            "image directory does not exist; template checks skipped",
        )
        .in_file(image_dir)];
    }

    declared
        .into_iter()
        .filter(|(_, template)| !image_dir.join(template).exists())
        .map(|(node, template)| {
            Issue::warn(
                IssueCode::MissingTemplate,
                format!(
                    "template image not found: {} (expected at {})",
                    template,
                    image_dir.join(template).display()
                ),
            )
            .in_file(node.file())
            .at_node(node.name())
            .at_field(TEMPLATE_FIELD)
        })
        .collect()
}
