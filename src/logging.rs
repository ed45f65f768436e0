//! Tracing subscriber setup for the `rewind` binary.

use tracing_subscriber::filter::LevelFilter;

const DEFAULT_LOG_LEVEL: &str = "warn";

/// Install a stderr fmt subscriber at the given level (default `warn`).
///
/// Keeps the existing subscriber if one is already installed.
///
/// # Errors
///
/// Returns an error string if the level is invalid or the subscriber cannot be installed.
pub fn init(level: Option<&str>) -> Result<(), String> {
    let level = resolve_level(level)?;
    match tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
    {
        Ok(()) => Ok(()),
        Err(_) if tracing::dispatcher::has_been_set() => Ok(()),
        Err(err) => Err(format!("initialize logging subscriber: {err}")),
    }
}

fn resolve_level(level: Option<&str>) -> Result<LevelFilter, String> {
    let raw = level.unwrap_or(DEFAULT_LOG_LEVEL);
    raw.trim().to_ascii_lowercase().parse::<LevelFilter>().map_err(|_| {
        format!("invalid log level `{raw}`; expected one of trace, debug, info, warn, error, off")
    })
}

#[cfg(test)]
mod tests {
    use super::resolve_level;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn defaults_to_warn() {
        assert_eq!(resolve_level(None).unwrap(), LevelFilter::WARN);
    }

    #[test]
    fn accepts_mixed_case() {
        assert_eq!(resolve_level(Some(" Debug ")).unwrap(), LevelFilter::DEBUG);
    }

    #[test]
    fn rejects_unknown_level() {
        let err = resolve_level(Some("loud")).unwrap_err();
        assert!(err.contains("invalid log level `loud`"));
    }
}
