//! Live adapter for the `HttpTransport` port using reqwest.

use reqwest::{Client, Method};

use crate::error::TransportError;
use crate::ports::transport::{HttpRequest, HttpResponse, HttpTransport, TransportFuture};

/// Transport that performs real HTTP calls.
pub struct LiveTransport {
    client: Client,
}

impl LiveTransport {
    /// Creates a transport with a default reqwest client.
    #[must_use]
    pub fn new() -> Self {
        Self { client: Client::new() }
    }

    /// Creates a transport around a preconfigured client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for LiveTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTransport for LiveTransport {
    fn send(&self, request: &HttpRequest) -> TransportFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
                TransportError::Http(format!("invalid method {}: {e}", request.method))
            })?;

            let mut builder = self.client.request(method, request.url.as_str());
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Http(format!("{} {}: {e}", request.method, request.url)))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned())
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Http(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, headers, body })
        })
    }
}
