//! Segment service entry-point: loads settings, connects storage, and runs
//! the expiry sweeper until interrupted.

mod server;

use ortho_config::OrthoConfig;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use segments::config::SegmentsSettings;

use server::ServerConfig;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = SegmentsSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;

    let config = server::connect(ServerConfig::new(settings)).await.map_err(|e| {
        error!(error = %e, "storage setup failed");
        std::io::Error::other(e.to_string())
    })?;

    server::run(config).await.map_err(|e| {
        error!(error = %e, "segment service stopped with an error");
        std::io::Error::other(e.to_string())
    })
}
