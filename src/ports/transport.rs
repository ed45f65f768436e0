//! HTTP transport port used by clients under test.

use std::future::Future;
use std::pin::Pin;

use reqwest::Url;

use crate::error::TransportError;

/// Boxed future type alias used by [`HttpTransport`] to keep the trait dyn-compatible.
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// An outbound HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (e.g. `"POST"`).
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    /// Request headers in send order.
    pub headers: Vec<(String, String)>,
    /// Request body text, if any.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a request without headers or body.
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into(), url: url.into(), headers: Vec::new(), body: None }
    }

    /// Shorthand for a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Shorthand for a `POST` request carrying `body`.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new("POST", url).with_body(body)
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Split the URL into its scope (`scheme://host[:port]`) and path plus query.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the URL does not parse or has no host.
    pub fn scope_and_path(&self) -> Result<(String, String), TransportError> {
        let invalid = |message: String| TransportError::InvalidUrl { url: self.url.clone(), message };
        let url = Url::parse(&self.url).map_err(|e| invalid(e.to_string()))?;
        let host = url.host_str().ok_or_else(|| invalid("missing host".into()))?;
        let scope = match url.port() {
            Some(port) => format!("{}://{host}:{port}", url.scheme()),
            None => format!("{}://{host}", url.scheme()),
        };
        let path = match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        };
        Ok((scope, path))
    }
}

/// An HTTP response as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers in receive order.
    pub headers: Vec<(String, String)>,
    /// Response body text.
    pub body: String,
}

/// Sends HTTP requests.
pub trait HttpTransport: Send + Sync {
    /// Sends a request and resolves to its response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be completed (refused connection,
    /// invalid URL, client failure).
    fn send(&self, request: &HttpRequest) -> TransportFuture<'_>;
}
