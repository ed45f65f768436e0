//! Live adapter for the `IdentitySource` port backed by libtest thread names.

use crate::ports::identity::{IdentitySource, TestIdentity};

/// Reads the current test from the thread name libtest assigns to each test
/// (e.g. `api::tests::fetches_block`).
///
/// Only meaningful on the test's own thread: `#[test]` bodies and
/// current-thread `#[tokio::test]` bodies. Returns `None` on `main`, which is
/// where libtest runs tests when `--test-threads=1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadNameIdentity;

impl IdentitySource for ThreadNameIdentity {
    fn current_test(&self) -> Option<TestIdentity> {
        let thread = std::thread::current();
        thread.name().filter(|name| *name != "main").map(TestIdentity::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_running_test() {
        let identity = ThreadNameIdentity.current_test();
        // Single-threaded runs execute on `main` and report nothing.
        if let Some(identity) = identity {
            assert!(identity.as_str().ends_with("reports_the_running_test"));
        }
    }

    #[test]
    fn unnamed_threads_report_nothing() {
        let identity = std::thread::spawn(|| ThreadNameIdentity.current_test()).join().unwrap();
        assert_eq!(identity, None);
    }
}
