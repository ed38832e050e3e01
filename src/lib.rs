//! pipecheck - static analysis for pipeline node-graph JSON
//!
//! A pipeline is a set of JSON files mapping node names to node objects
//! that point at each other through `next`, `on_error` and `interrupt`.
//! pipecheck loads every file, merges the nodes into one namespace and
//! reports dangling references, missing template images, unknown task
//! entries, unreachable nodes and badly ordered `next` lists before the
//! runtime ever sees them.

pub mod domain;
pub mod storage;
pub mod check;
pub mod cli;

pub use check::Analysis;
pub use domain::{Issue, IssueCode, Level, Report};
