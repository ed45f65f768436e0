//! JSON-RPC normalization for replay.
//!
//! JSON-RPC ids are caller-generated sequence numbers, so the id recorded in
//! a cassette rarely equals the id a later caller sends, yet callers reject
//! responses whose id differs from their request's. Replay therefore matches
//! JSON-RPC requests on any numeric id and echoes the live id into the
//! recorded response.

use serde_json::{Map, Value};

use super::format::Interaction;
use crate::ports::boundary::{BodyPattern, RequestPattern, ValuePattern};

const JSONRPC_FIELD: &str = "jsonrpc";
const ID_FIELD: &str = "id";

/// Whether a JSON body is a JSON-RPC message.
#[must_use]
pub fn is_jsonrpc(body: &Value) -> bool {
    body.as_object().is_some_and(|b| b.contains_key(JSONRPC_FIELD))
}

/// Match criteria for replaying `interaction`.
///
/// JSON-RPC bodies accept any numeric id; every other field, and every other
/// kind of body, must match as recorded. A recorded request without a body
/// matches any body.
#[must_use]
pub fn relax(interaction: &Interaction) -> RequestPattern {
    let body = match &interaction.body {
        None => BodyPattern::Any,
        Some(Value::Object(fields)) if fields.contains_key(JSONRPC_FIELD) => {
            BodyPattern::Fields(
                fields
                    .iter()
                    .map(|(key, value)| {
                        let pattern = if key == ID_FIELD {
                            ValuePattern::AnyNumber
                        } else {
                            ValuePattern::Exact(value.clone())
                        };
                        (key.clone(), pattern)
                    })
                    .collect(),
            )
        }
        Some(other) => BodyPattern::Exact(other.clone()),
    };

    RequestPattern {
        scope: interaction.scope.clone(),
        method: interaction.method.clone(),
        path: interaction.path.clone(),
        body,
    }
}

/// Overwrite the response id with the live JSON-RPC request's id.
///
/// No-op when the request is empty, not JSON, not JSON-RPC, or carries no id,
/// and when the response is not a JSON object (or text holding one).
pub fn echo_request_id(request_body: Option<&str>, response: &mut Value) {
    let Some(text) = request_body.filter(|b| !b.is_empty()) else {
        return;
    };
    let Ok(request) = serde_json::from_str::<Value>(text) else {
        return;
    };
    if !is_jsonrpc(&request) {
        return;
    }
    let Some(id) = request.get(ID_FIELD) else {
        return;
    };

    if let Value::String(raw) = response {
        match serde_json::from_str::<Map<String, Value>>(raw) {
            Ok(parsed) => *response = Value::Object(parsed),
            Err(_) => return,
        }
    }
    if let Value::Object(fields) = response {
        fields.insert(ID_FIELD.to_string(), id.clone());
    }
}
