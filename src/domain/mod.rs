//! Domain models for pipecheck
//!
//! Contains the analysis logic without any I/O concerns.

mod graph;
mod issue;
mod node;
mod priority;
mod reference;
mod registry;

pub use graph::FlowGraph;
pub use issue::{
    Issue, IssueCode, Level, LevelCounts, Report, Stats, EXIT_ENVIRONMENT, EXIT_FAILED, EXIT_OK,
};
pub use node::{Node, NodeBody, DEFAULT_UNCONDITIONAL_TYPE};
pub use priority::{
    Classified, PriorityRule, PrioritySettings, PriorityViolation, RuleContext, RuleSet,
    DEFAULT_EXCEPTION_HANDLER, UNKNOWN_RANK, UNKNOWN_RULE,
};
pub use reference::{extract_refs, split_tags, Extraction, NodeRef, RefField, RefKind, RefShape, ShapeProblem};
pub use registry::{type_name, NodeRegistry, DEFAULT_METADATA_PREFIX};
