//! # Command-Line Interface
//!
//! User-facing commands and report formatting.
//!
//! ## Commands
//!
//! | Command | Scan | Checks |
//! |---------|------|--------|
//! | `check` | flat (or `--recursive`) | everything |
//! | `priority` | recursive | `next` priority order only |
//!
//! Both accept `--show-rules` to print the active priority table.
//!
//! ## Output Formats
//!
//! All commands support the `--format` flag:
//! - `text` (default) - one line per issue plus a summary line
//! - `json` - a single `{issues, summary, exit_code}` document
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) to trace each phase on stderr:
//! ```bash
//! pipecheck --verbose check --pipeline-dir assets/resource/pipeline
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments, execute the command and get the exit
//! code.

mod app;
mod check_cmd;
mod output;
mod priority_cmd;

pub use app::{run, Cli, Commands};
pub use check_cmd::CheckArgs;
pub use output::{internal_error_report, render_json, render_text, Output};
pub use priority_cmd::PriorityArgs;
