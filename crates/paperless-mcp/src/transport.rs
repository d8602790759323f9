//! JSON-RPC transports.
//!
//! Two ways to reach the same [`McpServer`]: newline-delimited messages on
//! stdin/stdout, and a stateless HTTP endpoint. Both decode one message,
//! hand it to [`McpServer::handle_request`], and write back whatever
//! response it produces.

use crate::health::{HealthChecker, HealthStatus};
use crate::server::McpServer;
use crate::types::{McpError, McpRequest, McpResponse, RequestId};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

/// Decode one raw JSON-RPC message and dispatch it.
///
/// Unparseable input yields a parse error with a null id; well-formed JSON
/// that is not a request yields an invalid request error. Notifications
/// yield nothing.
pub async fn handle_message(server: &McpServer, raw: &str) -> Option<McpResponse> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to parse JSON-RPC message");
            return Some(McpResponse::error(RequestId::Null, McpError::parse_error()));
        }
    };

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok())
        .unwrap_or(RequestId::Null);

    match serde_json::from_value::<McpRequest>(value) {
        Ok(request) => server.handle_request(request).await,
        Err(e) => {
            warn!(error = %e, "Malformed JSON-RPC request");
            Some(McpResponse::error(id, McpError::invalid_request()))
        }
    }
}

/// Serve newline-delimited JSON-RPC until the reader is exhausted.
pub async fn serve_stdio<R, W>(server: Arc<McpServer>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = handle_message(&server, line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }
    }

    debug!("Input closed, stopping stdio transport");
    Ok(())
}

#[derive(Clone)]
struct HttpState {
    server: Arc<McpServer>,
    health: HealthChecker,
}

/// Router with `POST /mcp` for JSON-RPC and `GET /health` for the upstream
/// health report.
pub fn http_router(server: Arc<McpServer>, health: HealthChecker) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(handle_health))
        .with_state(HttpState { server, health })
}

/// Bind and serve the HTTP transport until Ctrl-C.
pub async fn serve_http(router: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on http://{}/mcp", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn handle_mcp(State(state): State<HttpState>, body: Bytes) -> Response {
    let raw = match std::str::from_utf8(&body) {
        Ok(raw) => raw,
        Err(_) => {
            return Json(McpResponse::error(RequestId::Null, McpError::parse_error()))
                .into_response()
        }
    };

    match handle_message(&state.server, raw).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn handle_health(State(state): State<HttpState>) -> Response {
    let report = state.health.check().await;
    let status = match report.status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
    };
    (status, Json(report)).into_response()
}
