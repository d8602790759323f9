//! MCP server implementation
//!
//! This module provides the tool registry and JSON-RPC dispatcher. Tools are
//! registered once at startup; after that the server is only read, so a
//! single instance can serve concurrent requests from any transport.

use crate::clients::PaperlessError;
use crate::types::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

/// MCP server error types.
#[derive(Debug, Error)]
pub enum McpServerError {
    /// Tool not found
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The Paperless API call failed
    #[error(transparent)]
    Upstream(#[from] PaperlessError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpServerError {
    /// Convert to a JSON-RPC error object.
    pub fn to_mcp_error(&self) -> McpError {
        match self {
            McpServerError::ToolNotFound(_) | McpServerError::InvalidParams(_) => {
                McpError::invalid_params(self.to_string())
            }
            McpServerError::Upstream(PaperlessError::Api { status, path, body }) => {
                McpError::internal_error(self.to_string()).with_data(serde_json::json!({
                    "status": status,
                    "path": path,
                    "body": body,
                }))
            }
            McpServerError::Upstream(_) | McpServerError::Internal(_) => {
                McpError::internal_error(self.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for McpServerError {
    fn from(err: serde_json::Error) -> Self {
        McpServerError::Internal(err.to_string())
    }
}

/// Result type for MCP server operations.
pub type McpServerResult<T> = Result<T, McpServerError>;

/// Trait for tool implementations.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with given arguments.
    async fn execute(
        &self,
        args: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult>;
}

/// Context for tool execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Request correlation ID, attached to every log line of the call
    pub correlation_id: String,
}

impl ToolContext {
    /// Create a context with a fresh correlation ID.
    pub fn new() -> Self {
        Self::with_correlation_id(Uuid::new_v4().to_string())
    }

    /// Create a context with a caller-supplied correlation ID.
    pub fn with_correlation_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
        }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new()
    }
}

/// MCP server exposing the registered tools.
pub struct McpServer {
    /// Server info
    info: ServerInfo,

    /// Server capabilities
    capabilities: ServerCapabilities,

    /// Registered tools
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,

    /// Tool categories, in registration order
    categories: Arc<RwLock<Vec<String>>>,
}

impl McpServer {
    /// Create a new MCP server.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: false,
                }),
            },
            tools: Arc::new(RwLock::new(HashMap::new())),
            categories: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create with the default Paperless server identity.
    pub fn paperless() -> Self {
        Self::new("paperless-mcp", env!("CARGO_PKG_VERSION"))
    }

    /// Register a tool.
    pub async fn register_tool(&self, tool: Arc<dyn Tool>) {
        let definition = tool.definition();
        let name = definition.name.clone();

        if let Some(ref category) = definition.category {
            let mut categories = self.categories.write().await;
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        let mut tools = self.tools.write().await;
        if tools.insert(name.clone(), tool).is_some() {
            warn!(tool = %name, "Replaced previously registered tool");
        }
    }

    /// Register multiple tools.
    pub async fn register_tools(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register_tool(tool).await;
        }
    }

    /// Get all tool definitions, sorted by name.
    pub async fn list_tools(&self) -> Vec<ToolDefinition> {
        let tools = self.tools.read().await;
        let mut definitions: Vec<ToolDefinition> = tools.values().map(|t| t.definition()).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Get tools by category.
    pub async fn list_tools_by_category(&self, category: &str) -> Vec<ToolDefinition> {
        self.list_tools()
            .await
            .into_iter()
            .filter(|d| d.category.as_deref() == Some(category))
            .collect()
    }

    /// Get all categories.
    pub async fn list_categories(&self) -> Vec<String> {
        self.categories.read().await.clone()
    }

    /// Number of registered tools.
    pub async fn tool_count(&self) -> usize {
        self.tools.read().await.len()
    }

    /// Execute a tool.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> McpServerResult<ToolResult> {
        let tool = {
            let tools = self.tools.read().await;
            tools
                .get(name)
                .cloned()
                .ok_or_else(|| McpServerError::ToolNotFound(name.to_string()))?
        };

        let span = info_span!("tool_call", tool = %name, correlation_id = %context.correlation_id);
        let result = tool.execute(arguments, context).instrument(span).await;

        if let Err(ref e) = result {
            warn!(tool = %name, correlation_id = %context.correlation_id, error = %e, "Tool call failed");
        }

        result
    }

    /// Handle an MCP message. Notifications produce no response.
    pub async fn handle_request(&self, request: McpRequest) -> Option<McpResponse> {
        let id = match request.id {
            Some(id) => id,
            None => {
                debug!(method = %request.method, "Received notification");
                return None;
            }
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params.as_ref()),
            "ping" => McpResponse::success(id, serde_json::json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => McpResponse::error(id, McpError::method_not_found(&request.method)),
        };

        Some(response)
    }

    fn handle_initialize(&self, id: RequestId, params: Option<&serde_json::Value>) -> McpResponse {
        let protocol_version = params
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(PROTOCOL_VERSION);

        McpResponse::success(
            id,
            serde_json::json!({
                "protocolVersion": protocol_version,
                "capabilities": self.capabilities,
                "serverInfo": self.info
            }),
        )
    }

    async fn handle_tools_list(&self, id: RequestId) -> McpResponse {
        let tools = self.list_tools().await;
        McpResponse::success(id, serde_json::json!({ "tools": tools }))
    }

    async fn handle_tools_call(
        &self,
        id: RequestId,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let params = match params {
            Some(p) => p,
            None => return McpResponse::error(id, McpError::invalid_params("Missing params")),
        };

        let call: ToolCall = match serde_json::from_value(params) {
            Ok(c) => c,
            Err(e) => return McpResponse::error(id, McpError::invalid_params(e.to_string())),
        };

        let context = ToolContext::new();

        match self.call_tool(&call.name, call.arguments, &context).await {
            Ok(result) => match serde_json::to_value(result) {
                Ok(value) => McpResponse::success(id, value),
                Err(e) => McpResponse::error(id, McpError::internal_error(e.to_string())),
            },
            Err(e) => McpResponse::error(id, e.to_mcp_error()),
        }
    }

    /// Get server info.
    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    /// Get server capabilities.
    pub fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }
}
