//! The `priority` command: `next` ordering check only

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::output::Output;
use crate::check::Analysis;
use crate::domain::{RuleSet, EXIT_OK};
use crate::storage::{Config, ScanMode};

#[derive(Args, Debug, Default)]
pub struct PriorityArgs {
    /// Directory searched recursively for pipeline *.json files
    #[arg(long, env = "PIPECHECK_PIPELINE_DIR")]
    pub pipeline_dir: Option<PathBuf>,

    /// Fail on warnings too
    #[arg(long)]
    pub strict: bool,

    /// Print the priority rule table and exit
    #[arg(long)]
    pub show_rules: bool,
}

pub fn run(args: PriorityArgs, config: &Config, output: &Output) -> Result<u8> {
    let project = &config.project;
    let rules = RuleSet::with_defaults(&project.priority.settings());

    if args.show_rules {
        output.rules(&rules)?;
        return Ok(EXIT_OK);
    }

    let pipeline_dir = args
        .pipeline_dir
        .unwrap_or_else(|| config.resolve(&project.pipeline_dir));
    let strict = args.strict || project.strict;

    output.verbose_ctx(
        "load",
        &format!("Scanning {} recursively", pipeline_dir.display()),
    );
    let mut analysis = Analysis::scan(&pipeline_dir, ScanMode::Recursive, &project.metadata_prefix)?;
    analysis.require_nodes();
    if analysis.is_fatal() {
        return output.report(&analysis.finish(), strict);
    }

    output.verbose_ctx(
        "priority",
        &format!(
            "Applying {} rules to {} nodes",
            rules.rules().len(),
            analysis.registry().len()
        ),
    );
    analysis.check_priority(&rules);

    output.report(&analysis.finish(), strict)
}
