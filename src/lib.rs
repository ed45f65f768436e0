//! Record and replay HTTP interactions for deterministic tests.
//!
//! A [`cassette::Vcr`] owns an interception boundary (normally an
//! [`adapters::Interceptor`] that the client under test sends through). Each
//! test begins a session keyed by its identity: if the test's cassette entry
//! is missing the session records live traffic, if it exists the recorded
//! interactions are replayed and nothing else reaches the network, and on CI
//! a missing entry is an error. JSON-RPC ids are rewritten on replay so
//! responses always carry the live caller's id.
//!
//! The `rewind` binary inspects cassette files.

pub mod adapters;
pub mod cassette;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod ports;

pub use error::{Result, TransportError, VcrError};

use clap::Parser;

/// Build a [`cassette::CassetteTarget`] for a test in the calling file.
///
/// The identity is the name libtest reports for a `#[test]` function called
/// `name` in the calling module, so it agrees with
/// [`adapters::ThreadNameIdentity`].
///
/// The one-argument form locates the file as `CARGO_MANIFEST_DIR/file!()`,
/// which only holds for a package at its workspace root. Inside a larger
/// workspace `file!()` is relative to the workspace root; pass the test file
/// explicitly as the first argument instead.
#[macro_export]
macro_rules! cassette_target {
    ($name:literal) => {
        $crate::cassette_target!(::std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(file!()), $name)
    };
    ($test_file:expr, $name:literal) => {
        $crate::cassette::CassetteTarget::new(
            $test_file,
            $crate::ports::TestIdentity::for_test(module_path!(), $name),
        )
    };
}

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> std::result::Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    let env_level = config::VcrConfig::from_env().log_level;
    logging::init(cli.log_level.as_deref().or(env_level.as_deref()))?;
    commands::dispatch(&cli.command)
}
