//! Paperless MCP tools
//!
//! Each tool validates its arguments, makes one call through the shared
//! [`PaperlessClient`], and wraps the result in the JSON text envelope.
//! Invalid arguments are rejected here, before any request is sent.

pub mod documents;
pub mod objects;
pub mod tags;

pub use documents::*;
pub use objects::*;
pub use tags::*;

use crate::clients::{ObjectType, PaperlessClient};
use crate::server::{McpServerError, McpServerResult, Tool};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;

/// Get all available MCP tools, bound to one client.
///
/// Returns the document tools, the tag tools, and the list, create, update,
/// delete, and bulk edit tools for every taxonomy family.
///
/// # Example
///
/// ```rust,no_run
/// use paperless_mcp::clients::{PaperlessClient, PaperlessConfig};
/// use paperless_mcp::tools::all_tools;
/// use std::sync::Arc;
///
/// let config = PaperlessConfig::new("http://localhost:8000", "token");
/// let client = Arc::new(PaperlessClient::new(config).unwrap());
/// let tools = all_tools(client);
/// println!("Available tools: {}", tools.len());
/// ```
pub fn all_tools(client: Arc<PaperlessClient>) -> Vec<Arc<dyn Tool>> {
    let mut tools = Vec::new();

    // Documents (6)
    tools.extend(document_tools(client.clone()));

    // Tags (create/update, 2)
    tools.extend(tag_tools(client.clone()));

    // Taxonomy objects (list/delete/bulk edit for 3 families, create/update for 2)
    for kind in ObjectType::ALL {
        tools.extend(object_tools(client.clone(), kind));
    }

    tools
}

/// Deserialize tool arguments. A missing argument object counts as empty.
pub(crate) fn parse_params<T>(args: Value) -> McpServerResult<T>
where
    T: DeserializeOwned,
{
    let args = match args {
        Value::Null => json!({}),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| McpServerError::InvalidParams(e.to_string()))
}

pub(crate) fn id_schema(description: &str) -> Value {
    json!({
        "type": "integer",
        "description": description
    })
}

pub(crate) fn id_list_schema(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "integer"},
        "description": description
    })
}

pub(crate) fn page_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Page number (1-based)"
    })
}

pub(crate) fn page_size_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 1,
        "description": "Number of results per page"
    })
}

pub(crate) fn matching_algorithm_schema() -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "maximum": 6,
        "description": "Matching algorithm: 0 none, 1 any, 2 all, 3 exact, 4 regex, 5 fuzzy, 6 automatic"
    })
}

pub(crate) fn permissions_schema() -> Value {
    let set = json!({
        "type": "object",
        "properties": {
            "users": {"type": "array", "items": {"type": "integer"}},
            "groups": {"type": "array", "items": {"type": "integer"}}
        }
    });
    json!({
        "type": "object",
        "description": "View and change permissions",
        "properties": {
            "view": set.clone(),
            "change": set
        }
    })
}
