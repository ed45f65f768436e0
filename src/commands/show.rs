//! `rewind show` command.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cassette::{CassetteFile, CassetteStore, Interaction, LoadState};

/// Execute the `show` command.
///
/// Without `test`, lists every test in the cassette with its interaction
/// count. With `test`, lists that test's interactions. `yaml` dumps the
/// selection as YAML instead.
///
/// # Errors
///
/// Returns an error string if the cassette cannot be loaded or has no entry for `test`.
pub async fn run(test_file: &Path, test: Option<&str>, yaml: bool) -> Result<(), String> {
    let store = CassetteStore::for_test_file(test_file);
    let file = match store.load().await.map_err(|e| e.to_string())? {
        LoadState::Absent => {
            println!("No cassette at {}", store.path().display());
            return Ok(());
        }
        LoadState::Loaded(file) => file,
    };

    if let Some(name) = test {
        let entry = file
            .get(name)
            .ok_or_else(|| format!("No entry for test {name} in {}", store.path().display()))?;
        if yaml {
            print!("{}", to_yaml(entry)?);
        } else {
            print_entry(name, entry);
        }
        return Ok(());
    }

    if yaml {
        print!("{}", to_yaml(&file)?);
        return Ok(());
    }

    println!("Cassette: {}", store.path().display());
    if let Some(modified) = modified_at(store.path()) {
        println!("Modified: {}", modified.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    print_summary(&file);
    Ok(())
}

fn print_summary(file: &CassetteFile) {
    if file.is_empty() {
        println!("No tests recorded.");
        return;
    }
    println!("Tests:");
    for (name, entry) in file {
        println!("  {:>4}  {name}", entry.len());
    }
}

fn print_entry(name: &str, entry: &[Interaction]) {
    println!("Test: {name}");
    if entry.is_empty() {
        println!("  (recorded with no external calls)");
    }
    for (i, interaction) in entry.iter().enumerate() {
        println!("  {}. {}", i + 1, describe(interaction));
    }
}

fn describe(interaction: &Interaction) -> String {
    let rpc = if interaction.is_jsonrpc() { " [json-rpc]" } else { "" };
    format!("{} {} -> {}{rpc}", interaction.method, interaction.url(), interaction.status)
}

fn to_yaml<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_yaml::to_string(value).map_err(|e| format!("Failed to render YAML: {e}"))
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(modified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interaction(body: Option<serde_json::Value>) -> Interaction {
        Interaction {
            scope: "http://localhost:8545".into(),
            method: "POST".into(),
            path: "/".into(),
            body,
            status: 200,
            response: json!({"result": "0x1"}),
            headers: vec![],
        }
    }

    #[test]
    fn describe_marks_jsonrpc() {
        let rpc = interaction(Some(json!({"jsonrpc": "2.0", "id": 1})));
        assert_eq!(describe(&rpc), "POST http://localhost:8545/ -> 200 [json-rpc]");
        assert_eq!(describe(&interaction(None)), "POST http://localhost:8545/ -> 200");
    }

    #[test]
    fn yaml_renders_interactions() {
        let yaml = to_yaml(&[interaction(None)][..]).unwrap();
        assert!(yaml.contains("scope: http://localhost:8545"));
        assert!(yaml.contains("status: 200"));
    }

    #[tokio::test]
    async fn show_absent_cassette_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(&dir.path().join("api.rs"), None, false).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn show_unknown_test_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("api.rs");
        let store = CassetteStore::for_test_file(&test_file);
        store.put(&"api::known".into(), vec![interaction(None)]).await.unwrap();

        assert!(run(&test_file, Some("api::known"), false).await.is_ok());
        assert!(run(&test_file, Some("api::known"), true).await.is_ok());
        assert!(run(&test_file, None, false).await.is_ok());
        let err = run(&test_file, Some("api::unknown"), false).await.unwrap_err();
        assert!(err.contains("No entry for test api::unknown"));
    }
}
