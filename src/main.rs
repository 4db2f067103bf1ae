//! simple_bank - transfer service
//!
//! Usage: `simple_bank [--env <name>] [--port <port>]`
//!
//! Loads `config/<env>.yaml`, connects PostgreSQL, applies the schema, and
//! serves the HTTP API until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;

use simple_bank::config::AppConfig;
use simple_bank::db::Database;
use simple_bank::gateway::{self, state::AppState};
use simple_bank::transfer::{PgLedgerStore, TransferCoordinator};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = simple_bank::logging::init_logging(&app_config);

    tracing::info!("Starting simple_bank in {} mode", env);

    let database_url = app_config
        .database_url()
        .context("postgres_url is not configured and DATABASE_URL is not set")?;
    let db = Database::connect(&database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;
    db.apply_schema().await.context("Failed to apply schema")?;

    let store = Arc::new(PgLedgerStore::new(db.pool().clone()));
    let transfer_config = app_config.transfer.to_transfer_config();
    tracing::info!(
        max_attempts = transfer_config.retry.max_attempts,
        allow_overdraft = transfer_config.allow_overdraft,
        "Transfer coordinator initialized"
    );
    let coordinator = Arc::new(TransferCoordinator::with_config(store, transfer_config));

    let state = Arc::new(AppState::new(coordinator));
    gateway::run_server(&app_config.gateway, state).await?;

    db.pool().close().await;
    tracing::info!("simple_bank stopped");
    Ok(())
}
