//! `rewind check` command.

use std::path::Path;

use crate::cassette::{CassetteFile, CassetteStore, LoadState};

/// Execute the `check` command.
///
/// # Errors
///
/// Returns an error string if the cassette exists but cannot be read or parsed.
pub async fn run(test_file: &Path) -> Result<(), String> {
    let store = CassetteStore::for_test_file(test_file);
    match store.load().await.map_err(|e| e.to_string())? {
        LoadState::Absent => println!("No cassette at {}", store.path().display()),
        LoadState::Loaded(file) => println!("{}: {}", store.path().display(), summarize(&file)),
    }
    Ok(())
}

fn summarize(file: &CassetteFile) -> String {
    let empty = file.values().filter(|entry| entry.is_empty()).count();
    let interactions: usize = file.values().map(Vec::len).sum();
    format!("{} tests, {empty} with no external calls, {interactions} interactions", file.len())
}
