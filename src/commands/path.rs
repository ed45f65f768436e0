//! `rewind path`: print where a test file's cassette lives.

use std::path::Path;

use crate::cassette::cassette_path_for;

/// Print the cassette path for `test_file`.
///
/// # Errors
///
/// Never fails; returns `Result` for dispatch uniformity.
pub fn run(test_file: &Path) -> Result<(), String> {
    println!("{}", cassette_path_for(test_file).display());
    Ok(())
}
