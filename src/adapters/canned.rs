//! Canned transport: answers every request from a closure, without network.
//!
//! Handy as the inner transport of an [`Interceptor`](super::intercept::Interceptor)
//! in tests that need to prove the real network was never reached.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::TransportError;
use crate::ports::transport::{HttpRequest, HttpResponse, HttpTransport, TransportFuture};

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync>;

/// Transport that answers from a handler and counts calls.
pub struct CannedTransport {
    handler: Handler,
    calls: AtomicUsize,
}

impl CannedTransport {
    /// Answer each request with the handler's result.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    {
        Self { handler: Box::new(handler), calls: AtomicUsize::new(0) }
    }

    /// Answer every request with the same status and text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| Ok(HttpResponse { status, headers: Vec::new(), body: body.clone() }))
    }

    /// Refuse every request, as an offline network would.
    #[must_use]
    pub fn offline() -> Self {
        Self::new(|request| {
            Err(TransportError::Http(format!("{} {}: network unreachable", request.method, request.url)))
        })
    }

    /// Number of requests this transport has received.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpTransport for CannedTransport {
    fn send(&self, request: &HttpRequest) -> TransportFuture<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = (self.handler)(request);
        Box::pin(async move { result })
    }
}
