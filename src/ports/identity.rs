//! Test identity port: which test is currently running.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified name of a test, used as the cassette key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestIdentity(String);

impl TestIdentity {
    /// Wrap a fully qualified test name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name libtest gives the test `name` declared in `module_path`.
    ///
    /// libtest drops the crate segment: `mycrate::api::tests` + `fetches`
    /// is `api::tests::fetches`, and a test at the root of an integration
    /// test crate is just its function name.
    pub fn for_test(module_path: &str, name: &str) -> Self {
        match module_path.split_once("::") {
            Some((_, module)) => Self(format!("{module}::{name}")),
            None => Self(name.to_string()),
        }
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TestIdentity {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Reports the currently executing test.
pub trait IdentitySource: Send + Sync {
    /// The current test's identity, or `None` outside a test.
    fn current_test(&self) -> Option<TestIdentity>;
}
