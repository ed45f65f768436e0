//! In-process interception boundary.
//!
//! Clients under test send through an [`Interceptor`] instead of a live
//! transport. While inactive it is a plain passthrough; while active it
//! answers from one-shot mocks, forwards unmatched requests when real network
//! access is allowed, and refuses them otherwise.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::ports::boundary::{ExchangeObserver, InterceptionBoundary, MockDefinition};
use crate::ports::transport::{HttpRequest, HttpResponse, HttpTransport, TransportFuture};

struct State {
    active: bool,
    net_connect: bool,
    mocks: Vec<MockDefinition>,
    observer: Option<Arc<dyn ExchangeObserver>>,
}

enum Route {
    Mocked(HttpResponse),
    Passthrough(Option<Arc<dyn ExchangeObserver>>),
}

/// Interception boundary wrapping an inner (usually live) transport.
pub struct Interceptor {
    inner: Arc<dyn HttpTransport>,
    state: Mutex<State>,
}

impl Interceptor {
    /// Wrap `inner`. Starts inactive with real network access allowed.
    pub fn new(inner: Arc<dyn HttpTransport>) -> Self {
        Self {
            inner,
            state: Mutex::new(State {
                active: false,
                net_connect: true,
                mocks: Vec::new(),
                observer: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn route(&self, request: &HttpRequest) -> Result<Route, TransportError> {
        let mut state = self.lock();
        if !state.active {
            return Ok(Route::Passthrough(None));
        }

        // A URL without scope and path cannot match a mock; it is still
        // forwarded when real network access is allowed.
        let body = request.body.as_deref();
        if let Ok((scope, path)) = request.scope_and_path() {
            if let Some(index) = state
                .mocks
                .iter()
                .position(|mock| mock.pattern.matches(&scope, &request.method, &path, body))
            {
                let mock = state.mocks.remove(index);
                drop(state);
                debug!(method = %request.method, %scope, %path, "interceptor: matched mock");
                return Ok(Route::Mocked(respond(mock, body)));
            }
        }

        if !state.net_connect {
            warn!(
                method = %request.method,
                url = %request.url,
                pending = state.mocks.len(),
                "interceptor: no mock matches and real network access is disabled"
            );
            return Err(TransportError::NetConnectDisallowed {
                method: request.method.clone(),
                url: request.url.clone(),
            });
        }

        Ok(Route::Passthrough(state.observer.clone()))
    }
}

fn respond(mock: MockDefinition, request_body: Option<&str>) -> HttpResponse {
    let mut response = mock.response;
    if let Some(rewrite) = &mock.rewrite {
        rewrite(request_body, &mut response.body);
    }
    let body = response.body_text();
    HttpResponse { status: response.status, headers: response.headers, body }
}

impl HttpTransport for Interceptor {
    fn send(&self, request: &HttpRequest) -> TransportFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let observer = match self.route(&request)? {
                Route::Mocked(response) => return Ok(response),
                Route::Passthrough(observer) => observer,
            };
            let response = self.inner.send(&request).await?;
            if let Some(observer) = observer {
                observer.observe(&request, &response);
            }
            Ok(response)
        })
    }
}

impl InterceptionBoundary for Interceptor {
    fn activate(&self) {
        self.lock().active = true;
    }

    fn restore(&self) {
        self.lock().active = false;
    }

    fn is_active(&self) -> bool {
        self.lock().active
    }

    fn set_net_connect(&self, allowed: bool) {
        self.lock().net_connect = allowed;
    }

    fn define(&self, definition: MockDefinition) {
        self.lock().mocks.push(definition);
    }

    fn pending_mocks(&self) -> usize {
        self.lock().mocks.len()
    }

    fn clean_all(&self) {
        self.lock().mocks.clear();
    }

    fn set_observer(&self, observer: Option<Arc<dyn ExchangeObserver>>) {
        self.lock().observer = observer;
    }
}
