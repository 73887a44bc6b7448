//! Tool definitions attached to the remote agent.

use serde_json::{json, Value};

use super::types::RawConnection;

/// Connection metadata type that marks a Bing grounding resource.
pub const BING_CONNECTION_TYPE: &str = "bing_grounding";

/// Id of the first Bing grounding connection in the project, if any.
pub(crate) fn find_bing_connection(connections: &[RawConnection]) -> Option<&str> {
    connections
        .iter()
        .find(|c| c.metadata.get("type").and_then(|t| t.as_str()) == Some(BING_CONNECTION_TYPE))
        .map(|c| c.id.as_str())
}

/// Tool list for agent create/update requests.
pub(crate) fn toolset(bing_connection: Option<&str>, language: &str) -> Vec<Value> {
    match bing_connection {
        Some(connection_id) => vec![json!({
            "type": "bing_grounding",
            "bing_grounding": {
                "search_configurations": [{
                    "connection_id": connection_id,
                    "set_lang": language,
                }]
            }
        })],
        None => Vec::new(),
    }
}
