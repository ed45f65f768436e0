//! Command dispatch and handlers.

pub mod check;
pub mod path;
pub mod show;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// Handlers run on a single-threaded runtime since cassette I/O is async.
///
/// # Errors
///
/// Returns an error string if the runtime cannot start or the handler fails.
pub fn dispatch(command: &Command) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;

    runtime.block_on(async {
        match command {
            Command::Path { test_file } => path::run(test_file),
            Command::Show { test_file, test, yaml } => {
                show::run(test_file, test.as_deref(), *yaml).await
            }
            Command::Check { test_file } => check::run(test_file).await,
        }
    })
}
