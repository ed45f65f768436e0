//! Replays recorded interactions through an interception boundary.

use std::sync::Arc;

use tracing::debug;

use super::format::Interaction;
use super::normalize::{echo_request_id, relax};
use crate::ports::boundary::{InterceptionBoundary, MockDefinition, MockResponse, ResponseRewrite};

/// Turn recorded interactions into one-shot mock definitions, in order.
///
/// Definitions for JSON-RPC requests match on any numeric id and echo the
/// live request's id into the response.
#[must_use]
pub fn definitions(interactions: &[Interaction]) -> Vec<MockDefinition> {
    interactions
        .iter()
        .map(|interaction| {
            let rewrite: Option<ResponseRewrite> =
                interaction.is_jsonrpc().then(|| Arc::new(echo_request_id) as ResponseRewrite);
            MockDefinition {
                pattern: relax(interaction),
                response: MockResponse {
                    status: interaction.status,
                    headers: interaction.headers.clone(),
                    body: interaction.response.clone(),
                },
                rewrite,
            }
        })
        .collect()
}

/// Register `definitions` at the boundary and activate it with real network
/// access disabled, so unmatched requests fail as refused connections.
///
/// Returns the number of definitions installed.
pub fn install(boundary: &dyn InterceptionBoundary, definitions: Vec<MockDefinition>) -> usize {
    let count = definitions.len();
    boundary.set_net_connect(false);
    for definition in definitions {
        debug!(
            method = %definition.pattern.method,
            scope = %definition.pattern.scope,
            path = %definition.pattern.path,
            "replayer: installing definition"
        );
        boundary.define(definition);
    }
    boundary.activate();
    count
}
