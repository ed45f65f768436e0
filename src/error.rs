//! Error types for cassette sessions and the interception boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`VcrError`].
pub type Result<T> = std::result::Result<T, VcrError>;

/// Errors raised by the cassette store and the session controller.
#[derive(Error, Debug)]
pub enum VcrError {
    /// CI enforcement is on and the cassette has no entry for the test.
    #[error("No cassettes found. They must be in place before running tests on CI {}", path.display())]
    MissingFixture {
        /// Resolved cassette file path.
        path: PathBuf,
    },

    /// `begin` was called while another session still owns the boundary.
    #[error("a cassette session is already active for test {identity}")]
    SessionActive {
        /// Identity of the session currently holding the boundary.
        identity: String,
    },

    /// The cassette file exists but is not a valid cassette.
    #[error("malformed cassette file {}: {source}", path.display())]
    MalformedCassette {
        /// Cassette file path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The cassette file exists but could not be read.
    #[error("failed to read cassette file {}: {source}", path.display())]
    ReadCassette {
        /// Cassette file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cassette file (or its directory) could not be written.
    #[error("failed to write cassette file {}: {source}", path.display())]
    WriteCassette {
        /// Cassette file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The cassette contents could not be serialized.
    #[error("failed to serialize cassette: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced to HTTP callers sending through a transport.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Real network access is disabled and no mock matched the request.
    #[error("connection refused: no recorded interaction matches {method} {url} and real network access is disabled")]
    NetConnectDisallowed {
        /// Request method.
        method: String,
        /// Request URL.
        url: String,
    },

    /// The request URL could not be parsed.
    #[error("invalid request url {url}: {message}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        message: String,
    },

    /// The underlying HTTP client failed.
    #[error("http request failed: {0}")]
    Http(String),
}
