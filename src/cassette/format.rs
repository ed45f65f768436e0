//! Cassette data structures for recording and replaying HTTP interactions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::normalize::is_jsonrpc;
use crate::error::TransportError;
use crate::ports::boundary::parse_body;
use crate::ports::transport::{HttpRequest, HttpResponse};

/// A cassette file: test identity to its ordered recorded interactions.
///
/// A missing key means nothing was ever recorded for that test; a key mapped
/// to an empty list means a recording was made and no external call happened.
pub type CassetteFile = BTreeMap<String, Vec<Interaction>>;

/// A single recorded HTTP exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// `scheme://host[:port]`.
    pub scope: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Path plus query.
    pub path: String,
    /// Request body: JSON when it parsed as JSON, otherwise the raw text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Response status code.
    pub status: u16,
    /// Response body: JSON when it round-trips byte for byte, otherwise the
    /// raw text; `null` when empty.
    #[serde(default)]
    pub response: Value,
    /// Response headers as `[name, value]` pairs.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
}

impl Interaction {
    /// Build an interaction from a completed exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the request URL cannot be split into scope and path.
    pub fn from_exchange(
        request: &HttpRequest,
        response: &HttpResponse,
    ) -> Result<Self, TransportError> {
        let (scope, path) = request.scope_and_path()?;
        let body = request.body.as_deref().filter(|b| !b.is_empty()).map(|b| parse_body(Some(b)));
        Ok(Self {
            scope,
            method: request.method.to_ascii_uppercase(),
            path,
            body,
            status: response.status,
            response: response_value(&response.body),
            headers: response.headers.clone(),
        })
    }

    /// Full request URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}{}", self.scope, self.path)
    }

    /// Whether the recorded request body is a JSON-RPC message.
    #[must_use]
    pub fn is_jsonrpc(&self) -> bool {
        self.body.as_ref().is_some_and(is_jsonrpc)
    }
}

/// Keep JSON only when rendering it back reproduces the original bytes.
///
/// `Null` marks an empty body, so a literal `null` body stays raw text.
fn response_value(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(value) if !value.is_string() && !value.is_null() && value.to_string() == text => value,
        _ => Value::String(text.to_string()),
    }
}
