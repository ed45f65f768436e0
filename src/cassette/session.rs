//! Cassette sessions: decide between record, replay and failure for a test,
//! and persist what was recorded when the session ends.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{info, warn};

use super::format::Interaction;
use super::recorder::InteractionRecorder;
use super::replayer;
use super::store::{CassetteStore, CassetteTarget, PutOutcome};
use crate::config::VcrConfig;
use crate::error::{Result, VcrError};
use crate::ports::boundary::{InterceptionBoundary, MockDefinition};
use crate::ports::identity::TestIdentity;

/// Caller post-processing of replay definitions, applied after JSON-RPC relaxation.
pub type Transform = Box<dyn FnOnce(Vec<MockDefinition>) -> Vec<MockDefinition> + Send>;

/// Options for [`Vcr::begin`].
pub struct VcrOptions {
    /// Require an existing cassette entry and forbid recording.
    pub ci: bool,
    transform: Option<Transform>,
}

impl VcrOptions {
    /// Options with `ci` taken from the `CI` environment variable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_config(&VcrConfig::from_env())
    }

    /// Options with `ci` taken from `config`.
    #[must_use]
    pub fn from_config(config: &VcrConfig) -> Self {
        Self { ci: config.ci, transform: None }
    }

    /// Override CI enforcement; `false` allows recording live calls.
    #[must_use]
    pub fn with_ci(mut self, ci: bool) -> Self {
        self.ci = ci;
        self
    }

    /// Post-process replay definitions before they are installed.
    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: FnOnce(Vec<MockDefinition>) -> Vec<MockDefinition> + Send + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }
}

impl fmt::Debug for VcrOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VcrOptions")
            .field("ci", &self.ci)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// How a session is serving requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// No entry existed: live calls go through and are captured.
    Record,
    /// Recorded definitions answer requests; anything else is refused.
    Replay {
        /// Number of definitions installed.
        installed: usize,
    },
    /// The entry records zero calls: every request is refused.
    VerifiedEmpty,
}

/// Summary of an ended session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Test the session belonged to.
    pub identity: TestIdentity,
    /// Cassette file the session read and wrote.
    pub cassette_path: PathBuf,
    /// Mode the session ran in.
    pub mode: SessionMode,
    /// Number of exchanges captured (zero outside record mode).
    pub recorded: usize,
    /// What the store did with the result.
    pub persisted: PutOutcome,
    /// Replay definitions no request consumed.
    pub unused_definitions: usize,
}

/// Marks the boundary as owned by one session; released on drop.
struct ActiveClaim {
    slot: Arc<Mutex<Option<TestIdentity>>>,
}

impl ActiveClaim {
    fn acquire(slot: &Arc<Mutex<Option<TestIdentity>>>, identity: &TestIdentity) -> Result<Self> {
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = current.as_ref() {
            return Err(VcrError::SessionActive { identity: active.to_string() });
        }
        *current = Some(identity.clone());
        Ok(Self { slot: Arc::clone(slot) })
    }
}

impl Drop for ActiveClaim {
    fn drop(&mut self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Session controller owning one interception boundary.
///
/// At most one session runs per `Vcr` at a time. Tests that run in parallel
/// each need their own boundary and `Vcr`.
pub struct Vcr {
    boundary: Arc<dyn InterceptionBoundary>,
    active: Arc<Mutex<Option<TestIdentity>>>,
}

impl Vcr {
    /// Controller for `boundary`.
    pub fn new(boundary: Arc<dyn InterceptionBoundary>) -> Self {
        Self { boundary, active: Arc::new(Mutex::new(None)) }
    }

    /// The controlled boundary.
    #[must_use]
    pub fn boundary(&self) -> &Arc<dyn InterceptionBoundary> {
        &self.boundary
    }

    /// Whether a session currently owns the boundary.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.active.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Start a session for `target`.
    ///
    /// | entry          | `ci = false`   | `ci = true`      |
    /// |----------------|----------------|------------------|
    /// | absent         | record         | `MissingFixture` |
    /// | present, empty | verified-empty | verified-empty   |
    /// | present        | replay         | replay           |
    ///
    /// # Errors
    ///
    /// Returns [`VcrError::SessionActive`] if another session owns the
    /// boundary, [`VcrError::MissingFixture`] when CI enforcement finds no
    /// entry (before the boundary is touched), and cassette load errors.
    pub async fn begin(&self, target: CassetteTarget, options: VcrOptions) -> Result<Session> {
        let CassetteTarget { test_file, identity } = target;
        let claim = ActiveClaim::acquire(&self.active, &identity)?;
        let store = CassetteStore::for_test_file(&test_file);
        let entry = store.get(&identity).await?;

        let (mode, recorder) = match entry {
            None if options.ci => {
                return Err(VcrError::MissingFixture { path: store.path().to_path_buf() });
            }
            None => (SessionMode::Record, Some(InteractionRecorder::start(&*self.boundary))),
            Some(interactions) if interactions.is_empty() => {
                self.boundary.set_net_connect(false);
                self.boundary.activate();
                (SessionMode::VerifiedEmpty, None)
            }
            Some(interactions) => {
                let mut definitions = replayer::definitions(&interactions);
                if let Some(transform) = options.transform {
                    definitions = transform(definitions);
                }
                let installed = replayer::install(&*self.boundary, definitions);
                (SessionMode::Replay { installed }, None)
            }
        };

        info!(
            identity = %identity,
            cassette_path = %store.path().display(),
            ci = options.ci,
            mode = ?mode,
            "cassette session started"
        );

        Ok(Session {
            boundary: Arc::clone(&self.boundary),
            store,
            identity,
            mode,
            recorder,
            torn_down: false,
            _claim: claim,
        })
    }

    /// Run `body` inside a session for `target`, ending it afterwards.
    ///
    /// The boundary is torn down on every exit path; if `body` panics the
    /// session is dropped during unwinding and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Propagates [`Vcr::begin`] and [`Session::end`] failures.
    pub async fn with_cassette<F, Fut, T>(
        &self,
        target: CassetteTarget,
        options: VcrOptions,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let session = self.begin(target, options).await?;
        let value = body().await;
        session.end().await?;
        Ok(value)
    }
}

/// A running cassette session. End it with [`Session::end`]; dropping it
/// instead restores the boundary without persisting anything.
pub struct Session {
    boundary: Arc<dyn InterceptionBoundary>,
    store: CassetteStore,
    identity: TestIdentity,
    mode: SessionMode,
    recorder: Option<InteractionRecorder>,
    torn_down: bool,
    _claim: ActiveClaim,
}

impl Session {
    /// Mode this session runs in.
    #[must_use]
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Test this session belongs to.
    #[must_use]
    pub fn identity(&self) -> &TestIdentity {
        &self.identity
    }

    /// Cassette file this session reads and writes.
    #[must_use]
    pub fn cassette_path(&self) -> &std::path::Path {
        self.store.path()
    }

    /// Stop the session and persist what it recorded.
    ///
    /// The boundary is restored before persisting, so it is inert even if
    /// the write fails. An empty result never erases a non-empty entry.
    ///
    /// # Errors
    ///
    /// Returns cassette load or write errors.
    pub async fn end(mut self) -> Result<SessionReport> {
        let (recorded, unused_definitions) = self.teardown();
        if unused_definitions > 0 {
            warn!(
                identity = %self.identity,
                unused_definitions,
                "cassette session ended with unused recorded interactions"
            );
        }

        let recorded_count = recorded.len();
        let persisted = self.store.put(&self.identity, recorded).await?;
        info!(identity = %self.identity, persisted = ?persisted, "cassette session ended");

        Ok(SessionReport {
            identity: self.identity.clone(),
            cassette_path: self.store.path().to_path_buf(),
            mode: self.mode,
            recorded: recorded_count,
            persisted,
            unused_definitions,
        })
    }

    fn teardown(&mut self) -> (Vec<Interaction>, usize) {
        let recorded = match self.recorder.take() {
            Some(recorder) => recorder.stop(&*self.boundary),
            None => Vec::new(),
        };
        let unused = self.boundary.pending_mocks();
        self.boundary.clean_all();
        self.boundary.set_observer(None);
        self.boundary.restore();
        self.boundary.set_net_connect(true);
        self.torn_down = true;
        (recorded, unused)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.torn_down {
            warn!(
                identity = %self.identity,
                "cassette session dropped without end(); boundary restored, nothing persisted"
            );
            self.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{CannedTransport, Interceptor};
    use crate::ports::boundary::{BodyPattern, MockResponse, RequestPattern};
    use crate::ports::transport::{HttpRequest, HttpTransport};
    use serde_json::json;
    use std::path::Path;

    struct Fixture {
        _dir: tempfile::TempDir,
        test_file: PathBuf,
        live: Arc<CannedTransport>,
        interceptor: Arc<Interceptor>,
        vcr: Vcr,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("client.rs");
        let live = Arc::new(CannedTransport::text(200, "hello"));
        let interceptor = Arc::new(Interceptor::new(live.clone()));
        let vcr = Vcr::new(interceptor.clone());
        Fixture { _dir: dir, test_file, live, interceptor, vcr }
    }

    fn target(f: &Fixture, name: &str) -> CassetteTarget {
        CassetteTarget::new(&f.test_file, name)
    }

    fn offline() -> VcrOptions {
        VcrOptions::from_config(&VcrConfig::default())
    }

    #[tokio::test]
    async fn ci_without_entry_fails_before_touching_boundary() {
        let f = fixture();
        f.interceptor.define(MockDefinition {
            pattern: RequestPattern {
                scope: "http://x".into(),
                method: "GET".into(),
                path: "/".into(),
                body: BodyPattern::Any,
            },
            response: MockResponse { status: 200, headers: vec![], body: json!(null) },
            rewrite: None,
        });

        let Err(err) = f.vcr.begin(target(&f, "t::missing"), offline().with_ci(true)).await else {
            panic!("begin should fail on CI without a cassette");
        };
        let expected = f.test_file.parent().unwrap().join("__cassettes__/client.cassette.json");
        assert_eq!(
            err.to_string(),
            format!(
                "No cassettes found. They must be in place before running tests on CI {}",
                expected.display()
            )
        );
        assert!(!f.interceptor.is_active());
        assert_eq!(f.interceptor.pending_mocks(), 1);
        assert!(!f.vcr.is_busy());
        assert!(!expected.exists());
    }

    #[tokio::test]
    async fn overlapping_sessions_fail_fast() {
        let f = fixture();
        let first = f.vcr.begin(target(&f, "t::one"), offline()).await.unwrap();
        let Err(err) = f.vcr.begin(target(&f, "t::two"), offline()).await else {
            panic!("second begin should fail");
        };
        assert!(matches!(err, VcrError::SessionActive { ref identity } if identity == "t::one"));
        first.end().await.unwrap();
        assert!(!f.vcr.is_busy());
        f.vcr.begin(target(&f, "t::two"), offline()).await.unwrap().end().await.unwrap();
    }

    #[tokio::test]
    async fn record_then_replay() {
        let f = fixture();

        let session = f.vcr.begin(target(&f, "t::hello"), offline()).await.unwrap();
        assert_eq!(session.mode(), SessionMode::Record);
        let live = f.interceptor.send(&HttpRequest::get("http://example.com")).await.unwrap();
        assert_eq!(live.body, "hello");
        let report = session.end().await.unwrap();
        assert_eq!(report.recorded, 1);
        assert_eq!(report.persisted, PutOutcome::Written { count: 1 });
        assert_eq!(f.live.calls(), 1);

        let session = f.vcr.begin(target(&f, "t::hello"), offline().with_ci(true)).await.unwrap();
        assert_eq!(session.mode(), SessionMode::Replay { installed: 1 });
        let replayed = f.interceptor.send(&HttpRequest::get("http://example.com")).await.unwrap();
        assert_eq!(replayed, live);
        let report = session.end().await.unwrap();
        assert_eq!(report.persisted, PutOutcome::Preserved { existing: 1 });
        assert_eq!(report.unused_definitions, 0);
        assert_eq!(f.live.calls(), 1);
    }

    #[tokio::test]
    async fn verified_empty_refuses_calls() {
        let f = fixture();
        f.vcr.begin(target(&f, "t::quiet"), offline()).await.unwrap().end().await.unwrap();

        let session = f.vcr.begin(target(&f, "t::quiet"), offline().with_ci(true)).await.unwrap();
        assert_eq!(session.mode(), SessionMode::VerifiedEmpty);
        let result = f.interceptor.send(&HttpRequest::get("http://example.com")).await;
        assert!(result.is_err());
        let report = session.end().await.unwrap();
        assert_eq!(report.persisted, PutOutcome::Written { count: 0 });
        assert_eq!(f.live.calls(), 0);
    }

    #[tokio::test]
    async fn transform_runs_after_relaxation() {
        let f = fixture();
        let store = CassetteStore::for_test_file(&f.test_file);
        store
            .put(
                &"t::transform".into(),
                vec![Interaction {
                    scope: "http://example.com".into(),
                    method: "POST".into(),
                    path: "/search".into(),
                    body: Some(json!({"q": "recorded", "nonce": 1})),
                    status: 200,
                    response: json!({"hits": 3}),
                    headers: vec![],
                }],
            )
            .await
            .unwrap();

        let options = offline().with_transform(|mut definitions| {
            for definition in &mut definitions {
                definition.pattern.body = BodyPattern::Any;
            }
            definitions
        });
        let session = f.vcr.begin(target(&f, "t::transform"), options).await.unwrap();
        let response = f
            .interceptor
            .send(&HttpRequest::post("http://example.com/search", r#"{"q":"other","nonce":9}"#))
            .await
            .unwrap();
        assert_eq!(response.body, r#"{"hits":3}"#);
        session.end().await.unwrap();
    }

    #[tokio::test]
    async fn dropped_session_restores_boundary_without_persisting() {
        let f = fixture();
        {
            let _session = f.vcr.begin(target(&f, "t::dropped"), offline()).await.unwrap();
            assert!(f.interceptor.is_active());
            f.interceptor.send(&HttpRequest::get("http://example.com")).await.unwrap();
        }
        assert!(!f.interceptor.is_active());
        assert!(!f.vcr.is_busy());
        let store = CassetteStore::for_test_file(&f.test_file);
        assert_eq!(store.get(&"t::dropped".into()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_persist_still_restores_boundary() {
        let f = fixture();
        let session = f.vcr.begin(target(&f, "t::unwritable"), offline()).await.unwrap();
        f.interceptor.send(&HttpRequest::get("http://example.com")).await.unwrap();

        // A plain file where the cassette directory should be breaks persistence.
        let cassette_dir = f.test_file.parent().unwrap().join("__cassettes__");
        std::fs::write(&cassette_dir, "not a directory").unwrap();

        let result = session.end().await;
        assert!(matches!(
            result,
            Err(VcrError::ReadCassette { .. } | VcrError::WriteCassette { .. })
        ));
        assert!(!f.interceptor.is_active());
        assert!(!f.vcr.is_busy());
        assert!(Path::new(&cassette_dir).is_file());
    }

    #[tokio::test]
    async fn with_cassette_ends_session() {
        let f = fixture();
        let interceptor = f.interceptor.clone();
        let body = f
            .vcr
            .with_cassette(target(&f, "t::scoped"), offline(), || async move {
                interceptor.send(&HttpRequest::get("http://example.com")).await.unwrap().body
            })
            .await
            .unwrap();
        assert_eq!(body, "hello");
        assert!(!f.interceptor.is_active());
        let store = CassetteStore::for_test_file(&f.test_file);
        assert_eq!(store.get(&"t::scoped".into()).await.unwrap().map(|e| e.len()), Some(1));
    }
}
