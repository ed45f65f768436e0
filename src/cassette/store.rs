//! Cassette store: reads and writes the per-test-file cassette.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::format::{CassetteFile, Interaction};
use crate::error::{Result, VcrError};
use crate::ports::identity::{IdentitySource, TestIdentity};

/// Directory, next to the test file, holding its cassette.
pub const CASSETTE_DIR: &str = "__cassettes__";
/// File name suffix replacing the test file's extension(s).
pub const CASSETTE_SUFFIX: &str = ".cassette.json";

/// Derive the cassette path for a test file.
///
/// `dir/api.test.rs` becomes `dir/__cassettes__/api.cassette.json`: everything
/// from the first `.` of the file name is replaced.
#[must_use]
pub fn cassette_path_for(test_file: &Path) -> PathBuf {
    let dir = test_file.parent().unwrap_or_else(|| Path::new(""));
    let file_name = test_file.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();
    dir.join(CASSETTE_DIR).join(format!("{stem}{CASSETTE_SUFFIX}"))
}

/// Which test a session belongs to: its source file and fully qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassetteTarget {
    /// Path of the test source file; decides the cassette location.
    pub test_file: PathBuf,
    /// Key of the test's entry inside the cassette.
    pub identity: TestIdentity,
}

impl CassetteTarget {
    /// Create a target for `identity` defined in `test_file`.
    pub fn new(test_file: impl Into<PathBuf>, identity: impl Into<TestIdentity>) -> Self {
        Self { test_file: test_file.into(), identity: identity.into() }
    }

    /// Target the test `source` reports as running, or `None` outside a test.
    pub fn current(test_file: impl Into<PathBuf>, source: &dyn IdentitySource) -> Option<Self> {
        source.current_test().map(|identity| Self::new(test_file, identity))
    }

    /// The cassette file path for this target.
    #[must_use]
    pub fn cassette_path(&self) -> PathBuf {
        cassette_path_for(&self.test_file)
    }
}

/// Result of reading a cassette file.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// No cassette file exists yet.
    Absent,
    /// The file exists and parsed.
    Loaded(CassetteFile),
}

impl LoadState {
    /// The recorded entries, empty when the file is absent.
    #[must_use]
    pub fn into_file(self) -> CassetteFile {
        match self {
            Self::Absent => CassetteFile::new(),
            Self::Loaded(file) => file,
        }
    }
}

/// What `put` did with the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The entry was replaced and the file rewritten.
    Written {
        /// Number of interactions now stored for the identity.
        count: usize,
    },
    /// An empty result would have erased a non-empty entry; nothing written.
    Preserved {
        /// Number of interactions kept.
        existing: usize,
    },
}

/// Reads and writes one cassette file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CassetteStore {
    path: PathBuf,
}

impl CassetteStore {
    /// Store backed by the cassette file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store for the cassette belonging to `test_file`.
    #[must_use]
    pub fn for_test_file(test_file: &Path) -> Self {
        Self::new(cassette_path_for(test_file))
    }

    /// Cassette file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole cassette file.
    ///
    /// # Errors
    ///
    /// Returns [`VcrError::MalformedCassette`] if the file exists but does not
    /// parse, or [`VcrError::ReadCassette`] for other read failures.
    pub async fn load(&self) -> Result<LoadState> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "cassette file absent");
                return Ok(LoadState::Absent);
            }
            Err(source) => return Err(VcrError::ReadCassette { path: self.path.clone(), source }),
        };
        let file = serde_json::from_str(&content)
            .map_err(|source| VcrError::MalformedCassette { path: self.path.clone(), source })?;
        Ok(LoadState::Loaded(file))
    }

    /// The recorded entry for `identity`, or `None` if it was never recorded.
    ///
    /// # Errors
    ///
    /// Propagates [`CassetteStore::load`] failures.
    pub async fn get(&self, identity: &TestIdentity) -> Result<Option<Vec<Interaction>>> {
        Ok(self.load().await?.into_file().remove(identity.as_str()))
    }

    /// Store `interactions` as the entry for `identity`.
    ///
    /// An empty list never replaces a non-empty entry. Otherwise the entry is
    /// replaced and the whole file rewritten, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Propagates load failures and returns [`VcrError::WriteCassette`] if the
    /// file cannot be written.
    pub async fn put(
        &self,
        identity: &TestIdentity,
        interactions: Vec<Interaction>,
    ) -> Result<PutOutcome> {
        let mut file = self.load().await?.into_file();

        let existing = file.get(identity.as_str()).map_or(0, Vec::len);
        if interactions.is_empty() && existing > 0 {
            debug!(
                path = %self.path.display(),
                identity = %identity,
                existing,
                "keeping recorded interactions; session made no calls"
            );
            return Ok(PutOutcome::Preserved { existing });
        }

        let count = interactions.len();
        file.insert(identity.as_str().to_string(), interactions);
        self.write(&file).await?;
        info!(path = %self.path.display(), identity = %identity, count, "cassette saved");
        Ok(PutOutcome::Written { count })
    }

    async fn write(&self, file: &CassetteFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| VcrError::WriteCassette { path: self.path.clone(), source })?;
        }
        let mut content = serde_json::to_string_pretty(file)?;
        content.push('\n');
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| VcrError::WriteCassette { path: self.path.clone(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn interaction(path: &str) -> Interaction {
        Interaction {
            scope: "http://example.com".into(),
            method: "GET".into(),
            path: path.into(),
            body: None,
            status: 200,
            response: json!("hello"),
            headers: vec![],
        }
    }

    struct Fixed(Option<&'static str>);

    impl IdentitySource for Fixed {
        fn current_test(&self) -> Option<TestIdentity> {
            self.0.map(TestIdentity::from)
        }
    }

    #[test]
    fn current_target_follows_identity_source() {
        let target = CassetteTarget::current("tests/api.rs", &Fixed(Some("api::fetches"))).unwrap();
        assert_eq!(target, CassetteTarget::new("tests/api.rs", "api::fetches"));
        assert_eq!(CassetteTarget::current("tests/api.rs", &Fixed(None)), None);
    }

    #[test]
    fn path_replaces_everything_after_first_dot() {
        assert_eq!(
            cassette_path_for(Path::new("src/VCR.test.ts")),
            PathBuf::from("src/__cassettes__/VCR.cassette.json")
        );
        assert_eq!(
            cassette_path_for(Path::new("tests/api.rs")),
            PathBuf::from("tests/__cassettes__/api.cassette.json")
        );
    }

    #[test]
    fn path_without_directory() {
        assert_eq!(
            cassette_path_for(Path::new("api.rs")),
            PathBuf::from("__cassettes__/api.cassette.json")
        );
    }

    #[tokio::test]
    async fn absent_file_loads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = CassetteStore::new(dir.path().join("none.cassette.json"));
        assert_eq!(store.load().await.unwrap(), LoadState::Absent);
        assert_eq!(store.get(&"t".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_file_is_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.cassette.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = CassetteStore::new(&path);
        let err = store.get(&"t".into()).await.unwrap_err();
        assert!(matches!(err, VcrError::MalformedCassette { .. }));
        assert!(err.to_string().contains("bad.cassette.json"));
    }

    #[tokio::test]
    async fn empty_and_absent_entries_are_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = CassetteStore::new(dir.path().join("nested/dir/a.cassette.json"));

        let outcome = store.put(&"mod::empty".into(), Vec::new()).await.unwrap();
        assert_eq!(outcome, PutOutcome::Written { count: 0 });

        assert_eq!(store.get(&"mod::empty".into()).await.unwrap(), Some(Vec::new()));
        assert_eq!(store.get(&"mod::other".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_result_never_erases_recorded_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CassetteStore::new(dir.path().join("a.cassette.json"));
        let id: TestIdentity = "mod::recorded".into();

        store.put(&id, vec![interaction("/a"), interaction("/b")]).await.unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let outcome = store.put(&id, Vec::new()).await.unwrap();
        assert_eq!(outcome, PutOutcome::Preserved { existing: 2 });
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn put_replaces_entry_and_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = CassetteStore::new(dir.path().join("a.cassette.json"));

        store.put(&"one".into(), vec![interaction("/1")]).await.unwrap();
        store.put(&"two".into(), vec![interaction("/2")]).await.unwrap();
        store.put(&"one".into(), vec![interaction("/1b"), interaction("/1c")]).await.unwrap();

        let LoadState::Loaded(file) = store.load().await.unwrap() else {
            panic!("cassette should exist");
        };
        assert_eq!(file.len(), 2);
        assert_eq!(file["one"].len(), 2);
        assert_eq!(file["one"][0].path, "/1b");
        assert_eq!(file["two"][0].path, "/2");
    }

    #[tokio::test]
    async fn file_is_pretty_printed() {
        let dir = tempfile::tempdir().unwrap();
        let store = CassetteStore::new(dir.path().join("a.cassette.json"));
        store.put(&"one".into(), vec![interaction("/")]).await.unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("{\n  \"one\": [\n"));
        assert!(content.ends_with("]\n}\n"));
    }
}
