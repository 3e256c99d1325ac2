//! SAGA service binary.
//!
//! Config path: `$SAGA_CONFIG`, defaulting to `saga.yaml`.
//! Ctrl-C marks the service as draining (`/readyz` -> 503) and shuts down
//! gracefully.

use tracing_subscriber::{fmt, EnvFilter};

use saga_server::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "saga-server failed");
        std::process::exit(1);
    }
}

async fn run() -> saga_core::Result<()> {
    let path = std::env::var(config::CONFIG_PATH_ENV).unwrap_or_else(|_| "saga.yaml".into());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.server.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state.clone());

    tracing::info!(%listen, config = %path, "saga-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| saga_core::SagaError::Internal(format!("bind failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(state))
        .await
        .map_err(|e| saga_core::SagaError::Internal(format!("server failed: {e}")))?;

    tracing::info!("saga-server stopped");
    Ok(())
}

async fn shutdown(state: app_state::AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    state.set_draining();
    tracing::info!("draining");
}
