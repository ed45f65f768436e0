//! Environment-derived configuration.

use std::env;

/// Environment variable marking a CI run.
pub const CI_ENV: &str = "CI";
/// Environment variable holding the log level.
pub const LOG_ENV: &str = "REWIND_LOG";

/// Configuration read from the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcrConfig {
    /// Whether cassettes must already exist (no recording, no live calls).
    pub ci: bool,
    /// Log level requested through the environment, if any.
    pub log_level: Option<String>,
}

impl VcrConfig {
    /// Read configuration from the current process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            ci: lookup(CI_ENV).is_some_and(|v| is_truthy(&v)),
            log_level: lookup(LOG_ENV).filter(|v| !v.trim().is_empty()),
        }
    }
}

/// Any non-empty value counts as set, except the usual spellings of "off".
fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_ascii_lowercase();
    !matches!(value.as_str(), "" | "0" | "false" | "no" | "off")
}
