//! Runtime configuration object for the segment service process.

use segments::config::SegmentsSettings;
use segments::outbound::persistence::DbPool;

/// Loaded settings plus the storage connection, once established.
pub struct ServerConfig {
    pub(crate) settings: SegmentsSettings,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(settings: SegmentsSettings) -> Self {
        Self {
            settings,
            db_pool: None,
        }
    }

    /// Attach a database connection pool for persistence adapters.
    ///
    /// When provided, every storage port uses its PostgreSQL adapter.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
