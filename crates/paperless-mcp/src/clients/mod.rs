//! Service client for the Paperless-ngx REST API.
//!
//! - `config`: connection settings (base URL, token, API version, timeout)
//! - `models`: resource and request types
//! - `paperless`: the HTTP client and its error type
//!
//! The client is built from an explicit [`PaperlessConfig`] and never reads
//! process-wide state.

pub mod config;
pub mod models;
pub mod paperless;

pub use config::{ConfigError, PaperlessConfig};
pub use models::*;
pub use paperless::{DocumentDownload, PaperlessClient, PaperlessError};
