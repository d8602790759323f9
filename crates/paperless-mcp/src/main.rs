//! Paperless MCP Server
//!
//! Exposes a Paperless-ngx instance to MCP clients over stdio (default) or
//! HTTP (`--http`). Connection settings come from positional arguments,
//! falling back to `PAPERLESS_URL` and `API_KEY`.

use anyhow::Context;
use clap::Parser;
use paperless_mcp::clients::config::{DEFAULT_API_VERSION, DEFAULT_TIMEOUT_SECS};
use paperless_mcp::clients::{PaperlessClient, PaperlessConfig};
use paperless_mcp::health::{HealthCheckConfig, HealthChecker};
use paperless_mcp::tools::all_tools;
use paperless_mcp::{transport, McpServer};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "paperless-mcp", version)]
#[command(about = "MCP server for the Paperless-ngx document management API")]
struct Args {
    /// Paperless-ngx base URL, e.g. http://paperless.local:8000
    #[arg(env = "PAPERLESS_URL", value_name = "BASE_URL")]
    base_url: String,

    /// Paperless-ngx API token
    #[arg(env = "API_KEY", value_name = "TOKEN", hide_env_values = true)]
    token: String,

    /// Serve JSON-RPC over HTTP instead of stdio
    #[arg(long)]
    http: bool,

    /// Port for the HTTP transport
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Request timeout for Paperless-ngx calls, in seconds
    #[arg(long, env = "PAPERLESS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Paperless-ngx REST API version to request
    #[arg(long, env = "PAPERLESS_API_VERSION", default_value_t = DEFAULT_API_VERSION)]
    api_version: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("paperless_mcp=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = PaperlessConfig::new(args.base_url, args.token)
        .with_api_version(args.api_version)
        .with_timeout_secs(args.timeout_secs);
    config.validate().context("invalid Paperless-ngx configuration")?;

    tracing::info!(base_url = %config.base_url, api_version = config.api_version, "paperless-mcp starting");

    let client = Arc::new(PaperlessClient::new(config).context("failed to build API client")?);

    let server = Arc::new(McpServer::paperless());
    server.register_tools(all_tools(client.clone())).await;
    tracing::info!(tools = server.tool_count().await, "Registered tools");

    if args.http {
        let health = HealthChecker::new(client, HealthCheckConfig::default())
            .context("failed to build health checker")?;
        let router = transport::http_router(server, health);
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        transport::serve_http(router, addr)
            .await
            .context("HTTP transport failed")?;
    } else {
        tracing::info!("Serving on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        transport::serve_stdio(server, stdin, tokio::io::stdout())
            .await
            .context("stdio transport failed")?;
    }

    Ok(())
}
