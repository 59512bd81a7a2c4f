//! Main binary: serves the triage REST API until interrupted.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{core_config_from_env, router, AppState};
use triage_core::{InMemoryVisitStore, TriageEngine};

/// Main entry point for the triage service
///
/// Resolves configuration once, wires the engine to the in-memory store and serves the REST
/// router. Ctrl-C stops accepting connections and lets in-flight requests finish.
///
/// # Environment Variables
/// - `TRIAGE_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `TRIAGE_STORE_TIMEOUT_MS`: per-call store timeout (default: 5000)
/// - `TRIAGE_EWS_WINDOW_HOURS`: EWS distribution window (default: 24)
/// - `TRIAGE_FACILITY`: facility label (default: "ed.dev.1")
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("triage_run=info".parse()?)
                .add_directive("triage_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("TRIAGE_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = core_config_from_env()?;

    tracing::info!("++ Starting triage REST on {} for {}", rest_addr, cfg.facility());

    let engine = TriageEngine::new(cfg, Arc::new(InMemoryVisitStore::new()));
    let app = router(AppState::new(engine));

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("-- Triage REST stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
