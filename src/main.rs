//! pipecheck - static analyzer for pipeline node-graph JSON

use std::process::ExitCode;

use pipecheck::domain::{Issue, IssueCode, EXIT_ENVIRONMENT};

fn main() -> ExitCode {
    match pipecheck::cli::run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            println!("{}", Issue::error(IssueCode::InternalError, format!("{:#}", e)));
            ExitCode::from(EXIT_ENVIRONMENT)
        }
    }
}
