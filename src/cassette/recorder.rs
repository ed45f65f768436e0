//! Records live HTTP exchanges passing through an interception boundary.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, warn};

use super::format::Interaction;
use crate::ports::boundary::{ExchangeObserver, InterceptionBoundary};
use crate::ports::transport::{HttpRequest, HttpResponse};

#[derive(Default)]
struct Capture {
    interactions: Mutex<Vec<Interaction>>,
}

impl ExchangeObserver for Capture {
    fn observe(&self, request: &HttpRequest, response: &HttpResponse) {
        match Interaction::from_exchange(request, response) {
            Ok(interaction) => {
                debug!(
                    method = %interaction.method,
                    url = %interaction.url(),
                    status = interaction.status,
                    "recorder: captured exchange"
                );
                self.interactions.lock().unwrap_or_else(PoisonError::into_inner).push(interaction);
            }
            Err(e) => warn!(url = %request.url, error = %e, "recorder: skipping exchange"),
        }
    }
}

/// Captures every exchange the boundary lets through to the real network,
/// in completion order.
pub struct InteractionRecorder {
    capture: Arc<Capture>,
}

impl InteractionRecorder {
    /// Activate `boundary` with real network access allowed and start capturing.
    #[must_use]
    pub fn start(boundary: &dyn InterceptionBoundary) -> Self {
        let capture = Arc::new(Capture::default());
        boundary.set_net_connect(true);
        boundary.set_observer(Some(capture.clone()));
        boundary.activate();
        Self { capture }
    }

    /// Number of exchanges captured so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capture.interactions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been captured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop capturing, deactivate `boundary`, and return what was captured.
    ///
    /// Always returns a list; an empty one means no call was made.
    pub fn stop(self, boundary: &dyn InterceptionBoundary) -> Vec<Interaction> {
        boundary.set_observer(None);
        boundary.restore();
        std::mem::take(&mut *self.capture.interactions.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
