//! Analysis findings and the aggregated report
//!
//! Every check produces [`Issue`] values instead of returning errors, so a
//! defect in one file or node never stops the rest of the run. The
//! [`Report`] collects them in emission order and derives the exit code.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

/// Exit code for a clean run
pub const EXIT_OK: u8 = 0;

/// Exit code when validation failed
pub const EXIT_FAILED: u8 = 1;

/// Exit code for environment errors (missing directory, no input)
pub const EXIT_ENVIRONMENT: u8 = 2;

/// Severity of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Error,
    Warn,
    Info,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable machine-readable issue codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    PipelineDirNotFound,
    PipelineEmpty,
    PipelineJsonInvalid,
    DuplicateJsonKey,
    PipelineRootNotObject,
    InvalidNodeName,
    NodeNotObject,
    DuplicateNodeName,
    InvalidRefShape,
    InvalidRef,
    DanglingNodeRef,
    DanglingAnchorRef,
    MissingTemplate,
    ImageDirNotFound,
    InterfaceParseFailed,
    TaskEntryMissing,
    PipelineOverrideUnknown,
    UnreachableNode,
    ReachabilitySkipped,
    PriorityOrder,
    NoNodes,
    InternalError,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::PipelineDirNotFound => "PIPELINE_DIR_NOT_FOUND",
            IssueCode::PipelineEmpty => "PIPELINE_EMPTY",
            IssueCode::PipelineJsonInvalid => "PIPELINE_JSON_INVALID",
            IssueCode::DuplicateJsonKey => "DUPLICATE_JSON_KEY",
            IssueCode::PipelineRootNotObject => "PIPELINE_ROOT_NOT_OBJECT",
            IssueCode::InvalidNodeName => "INVALID_NODE_NAME",
            IssueCode::NodeNotObject => "NODE_NOT_OBJECT",
            IssueCode::DuplicateNodeName => "DUPLICATE_NODE_NAME",
            IssueCode::InvalidRefShape => "INVALID_REF_SHAPE",
            IssueCode::InvalidRef => "INVALID_REF",
            IssueCode::DanglingNodeRef => "DANGLING_NODE_REF",
            IssueCode::DanglingAnchorRef => "DANGLING_ANCHOR_REF",
            IssueCode::MissingTemplate => "MISSING_TEMPLATE",
            IssueCode::ImageDirNotFound => "IMAGE_DIR_NOT_FOUND",
            IssueCode::InterfaceParseFailed => "INTERFACE_PARSE_FAILED",
            IssueCode::TaskEntryMissing => "TASK_ENTRY_MISSING",
            IssueCode::PipelineOverrideUnknown => "PIPELINE_OVERRIDE_UNKNOWN",
            IssueCode::UnreachableNode => "UNREACHABLE_NODE",
            IssueCode::ReachabilitySkipped => "REACHABILITY_SKIPPED",
            IssueCode::PriorityOrder => "PRIORITY_ORDER",
            IssueCode::NoNodes => "NO_NODES",
            IssueCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding with optional location context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub level: Level,
    pub code: IssueCode,
    pub message: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_file"
    )]
    pub file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl Issue {
    pub fn new(level: Level, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            level,
            code,
            message: message.into(),
            file: None,
            node: None,
            field: None,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Level::Error, code, message)
    }

    pub fn warn(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Level::Warn, code, message)
    }

    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Level::Info, code, message)
    }

    /// Attaches the file the issue was found in
    pub fn in_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Attaches the node the issue belongs to
    pub fn at_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches the node field the issue belongs to
    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Forward-slash path text, lossy for names that are not UTF-8
fn display_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn serialize_file<S>(file: &Option<PathBuf>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match file {
        Some(path) => serializer.serialize_some(&display_path(path)),
        None => serializer.serialize_none(),
    }
}

impl fmt::Display for Issue {
    /// Formats as `[LEVEL][CODE] message (file, node=.., field=..)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}] {}", self.level, self.code, self.message)?;

        let mut location = Vec::new();
        if let Some(file) = &self.file {
            location.push(display_path(file));
        }
        if let Some(node) = &self.node {
            location.push(format!("node={}", node));
        }
        if let Some(field) = &self.field {
            location.push(format!("field={}", field));
        }

        if !location.is_empty() {
            write!(f, " ({})", location.join(", "))?;
        }
        Ok(())
    }
}

/// Issue counts per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

/// Sizes of the analyzed input, for the summary line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub files: usize,
    pub nodes: usize,
    pub anchors: usize,
    pub disabled: usize,
}

/// Ordered collection of issues from every phase
#[derive(Debug, Clone, Default)]
pub struct Report {
    issues: Vec<Issue>,
    stats: Stats,
    fatal: bool,
}

impl Report {
    /// Creates an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a report for a setup failure; analysis does not proceed
    pub fn fatal(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
            stats: Stats::default(),
            fatal: true,
        }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = Issue>) {
        self.issues.extend(issues);
    }

    /// Marks the run as an environment failure
    pub fn mark_fatal(&mut self) {
        self.fatal = true;
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn set_stats(&mut self, stats: Stats) {
        self.stats = stats;
    }

    /// Returns issues with the given code
    pub fn with_code(&self, code: IssueCode) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    pub fn counts(&self) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for issue in &self.issues {
            match issue.level {
                Level::Error => counts.errors += 1,
                Level::Warn => counts.warnings += 1,
                Level::Info => counts.infos += 1,
            }
        }
        counts
    }

    /// Derives the process exit code
    ///
    /// 2 for setup failures, 1 for any ERROR (or any WARN when strict),
    /// 0 otherwise.
    pub fn exit_code(&self, strict: bool) -> u8 {
        if self.fatal {
            return EXIT_ENVIRONMENT;
        }

        let counts = self.counts();
        if counts.errors > 0 || (strict && counts.warnings > 0) {
            EXIT_FAILED
        } else {
            EXIT_OK
        }
    }
}
