//! Monthly audit report rendering.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::AuditLog;
use crate::domain::service_support::map_audit_error;
use crate::domain::{Error, UserId};

/// Reads a user's audit history and renders it as CSV.
#[derive(Clone)]
pub struct AuditReportService {
    audit: Arc<dyn AuditLog>,
}

impl AuditReportService {
    pub fn new(audit: Arc<dyn AuditLog>) -> Self {
        Self { audit }
    }

    /// Render every entry recorded for `user_id` during `year`-`month`.
    ///
    /// One line per entry, `user_id,slug,operation,timestamp`, oldest first,
    /// each terminated by a newline. No header line is written.
    pub async fn monthly_report(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<String, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::invalid_request(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }

        let mut entries = self
            .audit
            .entries_for_month(user_id, year, month)
            .await
            .map_err(map_audit_error)?;
        entries.sort_by_key(|entry| entry.recorded_at);

        debug!(%user_id, year, month, entries = entries.len(), "audit report rendered");
        Ok(entries
            .iter()
            .map(|entry| entry.to_csv_line() + "\n")
            .collect())
    }
}
