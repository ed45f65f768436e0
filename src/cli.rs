//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for `rewind`.
#[derive(Debug, Parser)]
#[command(name = "rewind", version, about = "Inspect record/replay HTTP cassettes")]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error or off.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the cassette path for a test file.
    Path {
        /// Test source file.
        test_file: PathBuf,
    },
    /// List the tests in a cassette, or one test's interactions.
    Show {
        /// Test source file whose cassette to read.
        test_file: PathBuf,
        /// Fully qualified test name to show.
        #[arg(long)]
        test: Option<String>,
        /// Dump the selection as YAML.
        #[arg(long)]
        yaml: bool,
    },
    /// Fail if a cassette exists but cannot be parsed.
    Check {
        /// Test source file whose cassette to check.
        test_file: PathBuf,
    },
}
