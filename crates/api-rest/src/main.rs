//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the triage REST API on its own, backed by the in-memory visit store.
//!
//! ## Intended use
//! Useful for development and for poking at the API through the Swagger UI. The workspace's main
//! `triage-run` binary serves the same router with graceful shutdown.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};
use triage_core::{InMemoryVisitStore, TriageEngine};

/// Main entry point for the triage REST API server
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - see [`core_config_from_env`] for the core settings
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the core configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("triage_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = core_config_from_env()?;

    tracing::info!("-- Starting triage REST API on {} for {}", addr, cfg.facility());

    let engine = TriageEngine::new(cfg, Arc::new(InMemoryVisitStore::new()));
    let app = router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
