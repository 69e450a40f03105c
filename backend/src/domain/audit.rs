//! Membership audit entries and the best-effort append helper.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ports::AuditLog;
use crate::domain::{ChangeOperation, SegmentSlug, UserId};

/// Write-once record of one membership change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub user_id: UserId,
    pub slug: SegmentSlug,
    pub operation: ChangeOperation,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Render the entry as one CSV line without a trailing newline.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use segments::domain::{AuditEntry, ChangeOperation, SegmentSlug, UserId};
    ///
    /// let entry = AuditEntry {
    ///     user_id: UserId::new(1000),
    ///     slug: SegmentSlug::new("AVITO_30").expect("slug"),
    ///     operation: ChangeOperation::Add,
    ///     recorded_at: Utc.with_ymd_and_hms(2023, 8, 29, 10, 0, 0).single().expect("time"),
    /// };
    /// assert_eq!(entry.to_csv_line(), "1000,AVITO_30,add,2023-08-29T10:00:00Z");
    /// ```
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.user_id,
            self.slug,
            self.operation,
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

/// Append an entry, logging and discarding any failure.
///
/// Audit completeness is not guaranteed: a failed append is never retried
/// and never fails the mutation that produced it.
pub(crate) async fn append_best_effort(audit: &dyn AuditLog, entry: AuditEntry) {
    if let Err(error) = audit.append(&entry).await {
        warn!(
            user_id = %entry.user_id,
            slug = %entry.slug,
            operation = %entry.operation,
            %error,
            "audit append failed; entry dropped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{AuditLogError, MockAuditLog};
    use chrono::TimeZone;

    fn entry() -> AuditEntry {
        AuditEntry {
            user_id: UserId::new(5),
            slug: SegmentSlug::new("promo").expect("slug"),
            operation: ChangeOperation::Delete,
            recorded_at: Utc
                .with_ymd_and_hms(2023, 8, 31, 23, 59, 59)
                .single()
                .expect("valid time"),
        }
    }

    #[test]
    fn csv_line_uses_operation_label() {
        assert_eq!(entry().to_csv_line(), "5,promo,delete,2023-08-31T23:59:59Z");
    }

    #[tokio::test]
    async fn append_failures_are_swallowed() {
        let mut audit = MockAuditLog::new();
        audit
            .expect_append()
            .times(1)
            .returning(|_| Err(AuditLogError::query("disk full")));

        append_best_effort(&audit, entry()).await;
    }
}
