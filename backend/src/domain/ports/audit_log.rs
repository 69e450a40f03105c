//! Domain port for the append-only membership audit log.
//!
//! Writers treat this port as best-effort: failures are logged and dropped,
//! never surfaced to the caller of the mutation that produced the entry.

use async_trait::async_trait;

use crate::domain::{AuditEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors exposed by audit log adapters.
    pub enum AuditLogError {
        /// Audit store connection could not be established.
        Connection { message: String } => "audit log connection failed: {message}",
        /// Append or read failed during execution.
        Query { message: String } => "audit log query failed: {message}",
    }
}

/// Append/query port for membership audit entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Append one entry.
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError>;

    /// Read a user's entries recorded in the given calendar month, oldest
    /// first.
    async fn entries_for_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<AuditEntry>, AuditLogError>;
}

/// No-op implementation for deployments without an audit trail.
///
/// Appends are discarded and reads return no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpAuditLog;

#[async_trait]
impl AuditLog for NoOpAuditLog {
    async fn append(&self, _entry: &AuditEntry) -> Result<(), AuditLogError> {
        Ok(())
    }

    async fn entries_for_month(
        &self,
        _user_id: UserId,
        _year: i32,
        _month: u32,
    ) -> Result<Vec<AuditEntry>, AuditLogError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Ensures NoOpAuditLog accepts appends and reads back nothing.
    use super::*;
    use crate::domain::{ChangeOperation, SegmentSlug};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn noop_append_returns_ok() {
        let entry = AuditEntry {
            user_id: UserId::new(7),
            slug: SegmentSlug::new("beta").expect("slug"),
            operation: ChangeOperation::Add,
            recorded_at: Utc
                .with_ymd_and_hms(2023, 8, 28, 12, 0, 0)
                .single()
                .expect("valid time"),
        };
        assert!(NoOpAuditLog.append(&entry).await.is_ok());
    }

    #[tokio::test]
    async fn noop_read_returns_empty() {
        let entries = NoOpAuditLog
            .entries_for_month(UserId::new(7), 2023, 8)
            .await
            .expect("read succeeds");
        assert!(entries.is_empty());
    }

    #[test]
    fn error_constructor_accepts_str() {
        let err = AuditLogError::connection("refused");
        assert_eq!(err.to_string(), "audit log connection failed: refused");
    }
}
