//! Upstream health checks.
//!
//! The bridge itself holds no state, so "healthy" means the Paperless-ngx
//! instance answers the API root with the configured token. The HTTP
//! transport serves the report on `GET /health`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use paperless_mcp::clients::{PaperlessClient, PaperlessConfig};
//! use paperless_mcp::health::{HealthCheckConfig, HealthChecker};
//! use std::sync::Arc;
//!
//! async fn check_health() {
//!     let config = PaperlessConfig::new("http://localhost:8000", "token");
//!     let client = Arc::new(PaperlessClient::new(config).unwrap());
//!     let checker = HealthChecker::new(client, HealthCheckConfig::default()).unwrap();
//!
//!     let report = checker.check().await;
//!     println!("{:?}: {} ({}ms)", report.status, report.message, report.upstream.latency_ms);
//! }
//! ```

use crate::clients::{PaperlessClient, PaperlessError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, instrument, warn};

/// Response header carrying the server's API version.
const VERSION_HEADER: &str = "x-version";

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Upstream reachable and responsive.
    Healthy,
    /// Upstream reachable but slow.
    Degraded,
    /// Upstream unreachable or rejecting requests.
    Unhealthy,
}

/// Status of the upstream service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Service is healthy.
    Up,
    /// Service is degraded (slow responses).
    Degraded,
    /// Service is down.
    Down,
}

impl From<ServiceStatus> for HealthStatus {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Up => HealthStatus::Healthy,
            ServiceStatus::Degraded => HealthStatus::Degraded,
            ServiceStatus::Down => HealthStatus::Unhealthy,
        }
    }
}

/// Health check result for the upstream service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealth {
    /// Service name.
    pub name: String,

    /// Service status.
    pub status: ServiceStatus,

    /// Response latency in milliseconds.
    pub latency_ms: u64,

    /// Probed URL.
    pub url: String,

    /// Error message if unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// API version reported by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Health check report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Overall status.
    pub status: HealthStatus,

    /// Timestamp of the check (RFC 3339).
    pub timestamp: String,

    /// Upstream health.
    pub upstream: ServiceHealth,

    /// Bridge version.
    pub version: String,

    /// Uptime of this process in seconds.
    pub uptime_secs: u64,

    /// Summary message.
    pub message: String,
}

/// Health check configuration.
#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    /// Timeout for the probe request.
    pub check_timeout: Duration,

    /// Latency threshold for degraded status (ms).
    pub degraded_threshold_ms: u64,

    /// Include detailed error messages.
    pub include_details: bool,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(5),
            degraded_threshold_ms: 1000,
            include_details: true,
        }
    }
}

/// Health checker for the Paperless-ngx upstream.
#[derive(Clone)]
pub struct HealthChecker {
    /// HTTP client for probes, with the shorter health timeout.
    client: Client,

    /// API client whose configuration and headers are probed.
    paperless: Arc<PaperlessClient>,

    /// Health check configuration.
    health_config: HealthCheckConfig,

    /// Start time for uptime calculation.
    start_time: Instant,
}

impl HealthChecker {
    /// Create a new health checker.
    pub fn new(
        paperless: Arc<PaperlessClient>,
        health_config: HealthCheckConfig,
    ) -> Result<Self, PaperlessError> {
        let client = Client::builder()
            .timeout(health_config.check_timeout)
            .build()
            .map_err(PaperlessError::ClientBuild)?;

        Ok(Self {
            client,
            paperless,
            health_config,
            start_time: Instant::now(),
        })
    }

    /// Probe the upstream API root.
    #[instrument(skip(self))]
    pub async fn check(&self) -> HealthReport {
        let upstream = self.check_upstream().await;
        let status = HealthStatus::from(upstream.status);

        let message = match status {
            HealthStatus::Healthy => "Paperless-ngx reachable".to_string(),
            HealthStatus::Degraded => format!(
                "Paperless-ngx slow to respond ({}ms)",
                upstream.latency_ms
            ),
            HealthStatus::Unhealthy => "Paperless-ngx unavailable".to_string(),
        };

        HealthReport {
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            upstream,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            message,
        }
    }

    async fn check_upstream(&self) -> ServiceHealth {
        let url = self.paperless.config().api_url("/");
        let start = Instant::now();

        debug!("Checking Paperless-ngx health at {}", url);

        let headers = match self.paperless.standard_headers() {
            Ok(headers) => headers,
            Err(e) => return self.down(url, 0, e.to_string()),
        };

        match self.client.get(&url).headers(headers).send().await {
            Ok(response) => {
                let latency = start.elapsed().as_millis() as u64;
                let status_code = response.status();

                if !status_code.is_success() {
                    warn!(
                        status_code = status_code.as_u16(),
                        "Paperless-ngx health check returned non-success status"
                    );
                    return self.down(url, latency, format!("HTTP {}", status_code));
                }

                let version = response
                    .headers()
                    .get(VERSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);

                let status = if latency > self.health_config.degraded_threshold_ms {
                    warn!(latency_ms = latency, "Paperless-ngx response time exceeds threshold");
                    ServiceStatus::Degraded
                } else {
                    ServiceStatus::Up
                };

                ServiceHealth {
                    name: "paperless".to_string(),
                    status,
                    latency_ms: latency,
                    url,
                    error: None,
                    version,
                }
            }
            Err(e) => {
                let latency = start.elapsed().as_millis() as u64;
                error!(error = %e, "Paperless-ngx health check failed");
                self.down(url, latency, e.to_string())
            }
        }
    }

    fn down(&self, url: String, latency_ms: u64, detail: String) -> ServiceHealth {
        ServiceHealth {
            name: "paperless".to_string(),
            status: ServiceStatus::Down,
            latency_ms,
            url,
            error: if self.health_config.include_details {
                Some(detail)
            } else {
                Some("Connection failed".to_string())
            },
            version: None,
        }
    }
}
