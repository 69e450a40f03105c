//! In-memory adapters for the storage and audit ports.
//!
//! Used when no database is configured and by the integration tests. State
//! lives only as long as the process.

mod audit_log;
mod store;

pub use audit_log::InMemoryAuditLog;
pub use store::InMemorySegmentStore;
