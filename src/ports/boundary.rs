//! Interception boundary port: the layer between clients and the real network.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::transport::{HttpRequest, HttpResponse};

/// Hook run on a matched request before its mock response is released.
///
/// Receives the live request body (if any) and may rewrite the response body.
pub type ResponseRewrite = Arc<dyn Fn(Option<&str>, &mut Value) + Send + Sync>;

/// Matcher for a single JSON field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ValuePattern {
    /// The value must equal this one.
    Exact(Value),
    /// Any JSON number, or a string made only of ASCII digits.
    AnyNumber,
}

impl ValuePattern {
    /// Whether `value` satisfies this pattern.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Exact(expected) => expected == value,
            Self::AnyNumber => match value {
                Value::Number(_) => true,
                Value::String(s) => !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()),
                _ => false,
            },
        }
    }
}

/// Matcher for a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyPattern {
    /// Any body (or none) matches.
    Any,
    /// The body must equal this value: structurally when the live body is
    /// JSON, textually when it is raw text.
    Exact(Value),
    /// The body must be a JSON object with exactly these fields.
    Fields(BTreeMap<String, ValuePattern>),
}

impl BodyPattern {
    /// Whether the live body text satisfies this pattern.
    #[must_use]
    pub fn matches(&self, body: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Exact(expected) => &parse_body(body) == expected,
            Self::Fields(fields) => {
                let Value::Object(actual) = parse_body(body) else {
                    return false;
                };
                actual.len() == fields.len()
                    && fields
                        .iter()
                        .all(|(key, pattern)| actual.get(key).is_some_and(|v| pattern.matches(v)))
            }
        }
    }
}

/// Parse body text as JSON, falling back to a JSON string of the raw text.
#[must_use]
pub fn parse_body(body: Option<&str>) -> Value {
    let text = body.unwrap_or_default();
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Request criteria a mock definition answers.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPattern {
    /// `scheme://host[:port]`, compared case-insensitively.
    pub scope: String,
    /// HTTP method, compared case-insensitively.
    pub method: String,
    /// Path plus query, compared exactly.
    pub path: String,
    /// Body criteria.
    pub body: BodyPattern,
}

impl RequestPattern {
    /// Whether a live request with these parts satisfies the pattern.
    #[must_use]
    pub fn matches(&self, scope: &str, method: &str, path: &str, body: Option<&str>) -> bool {
        self.scope.eq_ignore_ascii_case(scope)
            && self.method.eq_ignore_ascii_case(method)
            && self.path == path
            && self.body.matches(body)
    }
}

/// Canned response returned for a matched request.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Body as JSON; a JSON string is sent verbatim, `null` as an empty body.
    pub body: Value,
}

impl MockResponse {
    /// Render the body as the text sent to the caller.
    #[must_use]
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::Null => String::new(),
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// A one-shot responder: answers the first matching request, then is spent.
#[derive(Clone)]
pub struct MockDefinition {
    /// Match criteria.
    pub pattern: RequestPattern,
    /// Response to release.
    pub response: MockResponse,
    /// Optional per-match response rewrite.
    pub rewrite: Option<ResponseRewrite>,
}

impl fmt::Debug for MockDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDefinition")
            .field("pattern", &self.pattern)
            .field("response", &self.response)
            .field("rewrite", &self.rewrite.is_some())
            .finish()
    }
}

/// Receives every exchange that passes through to the real network.
pub trait ExchangeObserver: Send + Sync {
    /// Called once per completed passthrough exchange, in completion order.
    fn observe(&self, request: &HttpRequest, response: &HttpResponse);
}

/// Controls interception of outbound HTTP traffic.
///
/// While active, requests are answered by defined mocks first; unmatched
/// requests either pass through to the real network (when allowed, and are
/// reported to the observer) or fail as refused connections.
pub trait InterceptionBoundary: Send + Sync {
    /// Start intercepting requests.
    fn activate(&self);
    /// Stop intercepting; requests go straight to the real network again.
    fn restore(&self);
    /// Whether interception is on.
    fn is_active(&self) -> bool;
    /// Allow or forbid unmatched requests to reach the real network.
    fn set_net_connect(&self, allowed: bool);
    /// Register a one-shot mock definition.
    fn define(&self, definition: MockDefinition);
    /// Number of defined mocks not yet consumed.
    fn pending_mocks(&self) -> usize;
    /// Drop every defined mock.
    fn clean_all(&self);
    /// Install or remove the passthrough exchange observer.
    fn set_observer(&self, observer: Option<Arc<dyn ExchangeObserver>>);
}
