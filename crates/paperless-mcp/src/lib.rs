//! # Paperless MCP
//!
//! This crate exposes a Paperless-ngx document management instance as a
//! set of MCP (Model Context Protocol) tools.
//!
//! ## Overview
//!
//! The paperless-mcp crate handles:
//! - **Clients**: a typed HTTP client for the Paperless-ngx REST API
//! - **Tools**: schema-validated operations built on that client
//! - **JSON-RPC**: MCP protocol dispatch over stdio or HTTP
//!
//! Supported methods:
//! - `initialize`: Initialize the MCP session
//! - `ping`: Liveness probe
//! - `tools/list`: List available tools
//! - `tools/call`: Execute a tool
//!
//! ## Available Tools
//!
//! ### Documents
//! - `list_documents`, `get_document`, `search_documents`
//! - `download_document`, `post_document`
//! - `bulk_edit_documents`
//!
//! ### Tags
//! - `list_tags`, `create_tag`, `update_tag`, `delete_tag`, `bulk_edit_tags`
//!
//! ### Correspondents
//! - `list_correspondents`, `create_correspondent`, `update_correspondent`,
//!   `delete_correspondent`, `bulk_edit_correspondents`
//!
//! ### Document Types
//! - `list_document_types`, `create_document_type`, `update_document_type`,
//!   `delete_document_type`, `bulk_edit_document_types`
//!
//! Every tool replies with a single text block holding pretty-printed JSON.
//! Failures are returned as JSON-RPC errors, never as a successful reply.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperless_mcp::clients::{PaperlessClient, PaperlessConfig};
//! use paperless_mcp::tools::all_tools;
//! use paperless_mcp::{McpRequest, McpServer};
//! use std::sync::Arc;
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PaperlessConfig::new("http://localhost:8000", "token");
//!     config.validate()?;
//!
//!     let client = Arc::new(PaperlessClient::new(config)?);
//!     let server = McpServer::paperless();
//!     server.register_tools(all_tools(client)).await;
//!
//!     let response = server.handle_request(McpRequest::new(1, "tools/list")).await;
//!     println!("{}", serde_json::to_string(&response)?);
//!     Ok(())
//! }
//! ```

pub mod clients;
pub mod health;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

// Re-export main types
pub use server::{McpServer, McpServerError, McpServerResult, Tool, ToolContext};
pub use types::{
    ContentBlock, McpError, McpRequest, McpResponse, RequestId, ServerCapabilities, ServerInfo,
    ToolCall, ToolCapabilities, ToolDefinition, ToolResult, PROTOCOL_VERSION,
};

// Re-export tool collections
pub use tools::{all_tools, document_tools, object_tools, tag_tools};

// Re-export the API client
pub use clients::{PaperlessClient, PaperlessConfig, PaperlessError};

// Re-export health check types
pub use health::{HealthCheckConfig, HealthChecker, HealthReport, HealthStatus, ServiceStatus};
