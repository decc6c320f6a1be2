//! compose-merge - merge a base compose file with per-project overrides

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = compose_merge::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
