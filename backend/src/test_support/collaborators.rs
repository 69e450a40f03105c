//! Misbehaving collaborator doubles shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::ports::{AuditLog, AuditLogError};
use crate::domain::{AuditEntry, UserId};

/// Audit log that rejects every call and counts the attempts.
#[derive(Debug, Default)]
pub struct FailingAuditLog {
    appends: AtomicUsize,
}

impl FailingAuditLog {
    /// Number of append attempts observed.
    pub fn append_attempts(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuditLog for FailingAuditLog {
    async fn append(&self, _entry: &AuditEntry) -> Result<(), AuditLogError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        Err(AuditLogError::connection("audit store offline"))
    }

    async fn entries_for_month(
        &self,
        _user_id: UserId,
        _year: i32,
        _month: u32,
    ) -> Result<Vec<AuditEntry>, AuditLogError> {
        Err(AuditLogError::connection("audit store offline"))
    }
}
