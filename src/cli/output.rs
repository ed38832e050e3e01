//! Output formatting for CLI commands
//!
//! Reports are rendered into a single buffer and written in one go once
//! analysis has finished.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde_json::json;

use crate::domain::{Issue, IssueCode, Report, RuleSet, UNKNOWN_RANK, UNKNOWN_RULE};
use crate::storage::OutputFormat;

/// Output helper for consistent formatting
pub struct Output {
    format: OutputFormat,
    verbose: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Prints the report and returns its exit code
    pub fn report(&self, report: &Report, strict: bool) -> Result<u8> {
        let exit_code = report.exit_code(strict);
        let rendered = match self.format {
            OutputFormat::Text => render_text(report),
            OutputFormat::Json => render_json(report, exit_code)?,
        };
        emit(&rendered)?;
        Ok(exit_code)
    }

    /// Prints an error that stopped the run as a fatal report
    pub fn internal_error(&self, error: &anyhow::Error) -> Result<u8> {
        self.report(&internal_error_report(error), false)
    }

    /// Prints the priority rule table
    pub fn rules(&self, rules: &RuleSet) -> Result<()> {
        let mut table: Vec<(u32, &str)> = rules.rules().iter().map(|r| (r.rank(), r.name())).collect();
        table.push((UNKNOWN_RANK, UNKNOWN_RULE));

        let rendered = match self.format {
            OutputFormat::Text => {
                let mut out = format!("{:<6} RULE\n", "RANK");
                for (rank, name) in &table {
                    out.push_str(&format!("{:<6} {}\n", rank, name));
                }
                out
            }
            OutputFormat::Json => {
                let items: Vec<_> = table
                    .iter()
                    .map(|(rank, name)| json!({"rank": rank, "name": name}))
                    .collect();
                let mut out = serde_json::to_string(&json!({ "rules": items }))?;
                out.push('\n');
                out
            }
        };
        emit(&rendered)
    }

    /// Prints a verbose debug message (only when --verbose is set)
    pub fn verbose(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", message);
        }
    }

    /// Prints a verbose debug message with context (only when --verbose is set)
    pub fn verbose_ctx(&self, context: &str, message: &str) {
        if self.verbose {
            eprintln!("[verbose:{}] {}", context, message);
        }
    }
}

/// A fatal report holding one `INTERNAL_ERROR` with the full context chain
pub fn internal_error_report(error: &anyhow::Error) -> Report {
    Report::fatal(Issue::error(IssueCode::InternalError, format!("{:#}", error)))
}

fn emit(rendered: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(rendered.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write report")
}

/// One line per issue, a blank line, then the summary
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    for issue in report.issues() {
        out.push_str(&issue.to_string());
        out.push('\n');
    }
    if !report.issues().is_empty() {
        out.push('\n');
    }

    let stats = report.stats();
    let counts = report.counts();
    out.push_str(&format!(
        "checked: files={} nodes={} anchors={} disabled={} errors={} warnings={} infos={}\n",
        stats.files,
        stats.nodes,
        stats.anchors,
        stats.disabled,
        counts.errors,
        counts.warnings,
        counts.infos
    ));
    out
}

pub fn render_json(report: &Report, exit_code: u8) -> Result<String> {
    let stats = report.stats();
    let counts = report.counts();
    let issues = serde_json::to_value(report.issues()).context("Failed to serialize issues")?;
    let doc = json!({
        "issues": issues,
        "summary": {
            "files": stats.files,
            "nodes": stats.nodes,
            "anchors": stats.anchors,
            "disabled": stats.disabled,
            "errors": counts.errors,
            "warnings": counts.warnings,
            "infos": counts.infos,
        },
        "exit_code": exit_code,
    });

    let mut out = serde_json::to_string_pretty(&doc).context("Failed to serialize report")?;
    out.push('\n');
    Ok(out)
}
