pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use state::AppState;

/// Build the HTTP router over shared state
pub fn router(state: Arc<AppState>) -> Router {
    let accounts = Router::new()
        .route(
            "/",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route("/{id}", get(handlers::get_account))
        .route("/{id}/entries", get(handlers::list_account_entries));

    let transfers = Router::new()
        .route("/", post(handlers::create_transfer))
        .route("/{id}", get(handlers::get_transfer));

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/accounts", accounts)
        .nest("/api/v1/transfers", transfers)
        .with_state(state)
}

/// Start HTTP Gateway server
///
/// Runs until Ctrl-C, then drains in-flight requests.
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            config.port
        )
    })?;

    tracing::info!(
        %addr,
        store = state.store().name(),
        "Gateway listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
