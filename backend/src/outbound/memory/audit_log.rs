//! Process-local append-only audit log.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Datelike;

use crate::domain::ports::{AuditLog, AuditLogError};
use crate::domain::{AuditEntry, UserId};

/// Audit log kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry in append order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        self.entries
            .lock()
            .map_err(|_| AuditLogError::connection("in-memory audit log lock poisoned"))?
            .push(entry.clone());
        Ok(())
    }

    async fn entries_for_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<AuditEntry>, AuditLogError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AuditLogError::connection("in-memory audit log lock poisoned"))?;
        Ok(entries
            .iter()
            .filter(|entry| {
                entry.user_id == user_id
                    && entry.recorded_at.year() == year
                    && entry.recorded_at.month() == month
            })
            .cloned()
            .collect())
    }
}
