//! Builders for the storage handles and the service graph.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;

use segments::services::{SegmentServices, StorageHandles};

use super::ServerConfig;

/// Pick PostgreSQL adapters when a pool is attached, otherwise in-memory
/// storage.
fn build_storage(config: &ServerConfig) -> StorageHandles {
    match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL storage");
            StorageHandles::postgres(pool.clone())
        }
        None => {
            info!("no database configured; using in-memory storage");
            StorageHandles::in_memory()
        }
    }
}

pub(super) fn build_services(config: &ServerConfig) -> SegmentServices {
    SegmentServices::new(
        build_storage(config),
        config.settings.change_config(),
        config.settings.sweep_timeout(),
        Arc::new(DefaultClock),
    )
}
