//! # API REST
//!
//! REST transport for the triage engine.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON DTOs, CORS, error to status mapping)
//!
//! Clinical rules live in `triage-core`; this crate only parses, delegates and renders.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, ApiDoc, AppState};

use std::sync::Arc;
use triage_core::config::{ews_window_from_env_value, store_timeout_from_env_value};
use triage_core::constants::DEFAULT_FACILITY;
use triage_core::CoreConfig;

/// Resolve `CoreConfig` from the process environment. Call once at startup.
///
/// # Environment Variables
/// - `TRIAGE_STORE_TIMEOUT_MS`: per-call store timeout (default: 5000)
/// - `TRIAGE_EWS_WINDOW_HOURS`: EWS distribution window (default: 24)
/// - `TRIAGE_FACILITY`: facility label used in logs (default: "ed.dev.1")
pub fn core_config_from_env() -> anyhow::Result<Arc<CoreConfig>> {
    let store_timeout = store_timeout_from_env_value(std::env::var("TRIAGE_STORE_TIMEOUT_MS").ok())?;
    let ews_window = ews_window_from_env_value(std::env::var("TRIAGE_EWS_WINDOW_HOURS").ok())?;
    let facility = std::env::var("TRIAGE_FACILITY").unwrap_or_else(|_| DEFAULT_FACILITY.into());

    Ok(Arc::new(CoreConfig::new(store_timeout, ews_window, facility)?))
}
