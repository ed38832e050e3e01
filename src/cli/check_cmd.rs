//! The `check` command: full pipeline analysis

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use super::output::Output;
use crate::check::Analysis;
use crate::domain::{RuleSet, EXIT_OK};
use crate::storage::{Config, ScanMode};

#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// Directory holding pipeline *.json files
    #[arg(long, env = "PIPECHECK_PIPELINE_DIR")]
    pub pipeline_dir: Option<PathBuf>,

    /// Root directory for template images
    #[arg(long, env = "PIPECHECK_IMAGE_DIR")]
    pub image_dir: Option<PathBuf>,

    /// Interface document (JSON with comments) declaring task entries
    #[arg(long, env = "PIPECHECK_INTERFACE")]
    pub interface: Option<PathBuf>,

    /// Do not read the interface document (overrides --interface)
    #[arg(long)]
    pub no_interface: bool,

    /// Fail on warnings too
    #[arg(long)]
    pub strict: bool,

    /// Skip the unreachable-node check
    #[arg(long)]
    pub no_unreachable: bool,

    /// Skip the priority order check
    #[arg(long)]
    pub no_priority: bool,

    /// Scan subdirectories of the pipeline directory as well
    #[arg(long)]
    pub recursive: bool,

    /// Print the priority rule table and exit
    #[arg(long)]
    pub show_rules: bool,
}

/// Runs every analysis phase and prints the report
pub fn run(args: CheckArgs, config: &Config, output: &Output) -> Result<u8> {
    let project = &config.project;
    let rules = RuleSet::with_defaults(&project.priority.settings());

    if args.show_rules {
        output.rules(&rules)?;
        return Ok(EXIT_OK);
    }

    let pipeline_dir = args
        .pipeline_dir
        .unwrap_or_else(|| config.resolve(&project.pipeline_dir));
    let image_dir = args
        .image_dir
        .unwrap_or_else(|| config.resolve(&project.image_dir));
    let interface_path = args
        .interface
        .unwrap_or_else(|| config.resolve(&project.interface));
    let strict = args.strict || project.strict;
    let mode = if args.recursive || project.recursive {
        ScanMode::Recursive
    } else {
        ScanMode::Flat
    };

    output.verbose_ctx(
        "load",
        &format!("Scanning {} ({:?})", pipeline_dir.display(), mode),
    );
    let mut analysis = Analysis::scan(&pipeline_dir, mode, &project.metadata_prefix)?;
    if analysis.is_fatal() {
        return output.report(&analysis.finish(), strict);
    }
    output.verbose_ctx(
        "load",
        &format!(
            "Read {} files: {} nodes, {} anchors",
            analysis.files(),
            analysis.registry().len(),
            analysis.registry().anchors().len()
        ),
    );

    analysis.check_references();
    output.verbose_ctx("refs", "Validated next/on_error/interrupt references");

    analysis.check_resources(&image_dir);
    output.verbose_ctx(
        "resources",
        &format!("Checked templates under {}", image_dir.display()),
    );

    let entries = if args.no_interface {
        output.verbose_ctx("interface", "Interface disabled");
        Vec::new()
    } else {
        match analysis.read_interface(&interface_path) {
            Some(interface) => {
                output.verbose_ctx(
                    "interface",
                    &format!(
                        "{}: {} entries, {} override keys",
                        interface_path.display(),
                        interface.entries.len(),
                        interface.override_keys.len()
                    ),
                );
                analysis.check_interface(&interface);
                interface.entries
            }
            None => {
                output.verbose_ctx(
                    "interface",
                    &format!("No usable interface at {}", interface_path.display()),
                );
                Vec::new()
            }
        }
    };

    if args.no_unreachable || !project.unreachable {
        output.verbose_ctx("graph", "Unreachable-node check disabled");
    } else {
        let graph = analysis.flow_graph();
        output.verbose_ctx(
            "graph",
            &format!(
                "Built flow graph: {} nodes, {} edges, {} entries",
                graph.len(),
                graph.edge_count(),
                entries.len()
            ),
        );
        analysis.check_reachability(&graph, &entries);
    }

    if args.no_priority {
        output.verbose_ctx("priority", "Priority check disabled");
    } else {
        output.verbose_ctx(
            "priority",
            &format!("Applying {} rules", rules.rules().len()),
        );
        analysis.check_priority(&rules);
    }

    output.report(&analysis.finish(), strict)
}
