//! Process wiring: storage connection, service graph, and sweeper lifecycle.

mod config;
mod state_builders;

pub use config::ServerConfig;

use state_builders::build_services;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use segments::outbound::persistence::{
    DbPool, MigrationError, PoolConfig, PoolError, run_pending_migrations,
};

/// Errors that stop the service from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("schema migration failed: {0}")]
    Migration(#[from] MigrationError),
    #[error("database pool setup failed: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
    #[error("expiry sweeper task failed: {0}")]
    Sweeper(#[from] tokio::task::JoinError),
}

/// Migrate the schema and attach a pool when a database URL is configured.
///
/// # Errors
/// Returns [`ServerError`] when migrations or pool construction fail.
pub async fn connect(config: ServerConfig) -> Result<ServerConfig, ServerError> {
    let Some(url) = config.settings.database_url.clone() else {
        return Ok(config);
    };

    run_pending_migrations(&url).await?;
    let pool_config = PoolConfig::new(url).with_max_size(config.settings.pool_max_size);
    let pool = DbPool::new(pool_config).await?;
    Ok(config.with_db_pool(pool))
}

/// Build the services and sweep expired memberships until Ctrl-C.
///
/// # Errors
/// Returns [`ServerError`] when the shutdown signal cannot be installed or
/// the sweeper task panics.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let services = build_services(&config);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = services
        .sweeper
        .clone()
        .spawn(config.settings.sweep_interval(), shutdown_rx);

    info!("segment service ready");
    let signal = tokio::signal::ctrl_c().await;

    info!("shutting down");
    if shutdown_tx.send(true).is_err() {
        warn!("expiry sweeper already stopped");
    }
    sweeper.await?;
    signal.map_err(ServerError::Signal)
}
