//! Header Amalgam - single-header builder

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = header_amalgam::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
