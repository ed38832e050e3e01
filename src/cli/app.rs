//! Main CLI application structure

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::check_cmd::{self, CheckArgs};
use super::output::Output;
use super::priority_cmd::{self, PriorityArgs};
use crate::storage::{Config, OutputFormat};

#[derive(Parser)]
#[command(name = "pipecheck")]
#[command(author, version, about = "Static analyzer for pipeline node-graph JSON")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, else text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project config file (defaults to the nearest pipecheck.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every check: references, templates, entries, reachability, priority
    Check(CheckArgs),

    /// Check only the priority order of `next` lists
    Priority(PriorityArgs),
}

impl Commands {
    /// Returns true if the command only prints the rule table
    pub fn shows_rules(&self) -> bool {
        match self {
            Commands::Check(args) => args.show_rules,
            Commands::Priority(args) => args.show_rules,
        }
    }
}

/// Main entry point for the CLI, returning the process exit code
///
/// Errors that stop a run are printed as a fatal report in the selected
/// format. Only a failure to write that report escapes.
pub fn run() -> Result<u8> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::load(),
    };
    let format = cli
        .format
        .or_else(|| config.as_ref().ok().map(|c| c.global.default_format))
        .unwrap_or_default();
    let output = Output::new(format, cli.verbose);

    match dispatch(cli.command, config, &output) {
        Ok(code) => {
            output.verbose(&format!("Finished with exit code {}", code));
            Ok(code)
        }
        Err(e) => output.internal_error(&e),
    }
}

fn dispatch(command: Commands, config: Result<Config>, output: &Output) -> Result<u8> {
    let config = match config {
        Ok(config) => config,
        // Rule tables still print from the built-in settings
        Err(e) if command.shows_rules() => {
            output.verbose_ctx("config", &format!("Ignoring unreadable config: {:#}", e));
            Config::default()
        }
        Err(e) => return Err(e),
    };

    match &config.project_root {
        Some(root) => output.verbose_ctx("config", &format!("Project root: {}", root.display())),
        None => output.verbose_ctx("config", "No pipecheck.toml found, using defaults"),
    }

    match command {
        Commands::Check(args) => check_cmd::run(args, &config, output),
        Commands::Priority(args) => priority_cmd::run(args, &config, output),
    }
}
