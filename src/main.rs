//! Binary entrypoint for the `rewind` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // A local .env may set CI or REWIND_LOG; a missing file is fine.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            eprintln!("Failed to load .env: {err}");
            return ExitCode::FAILURE;
        }
    }
    match rewind::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
