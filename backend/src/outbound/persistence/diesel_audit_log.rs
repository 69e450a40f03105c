//! PostgreSQL-backed `AuditLog` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Months, NaiveDate, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{AuditLog, AuditLogError};
use crate::domain::{AuditEntry, ChangeOperation, SegmentSlug, UserId};

use super::error_mapping::{map_diesel_error, no_violation, pool_message};
use super::models::{AuditLogRow, NewAuditLogRow, user_id_from_column, user_id_to_column};
use super::pool::{DbPool, PoolError};
use super::schema::audit_log;

/// Diesel-backed implementation of the audit log port.
#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
}

impl DieselAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AuditLogError {
    AuditLogError::connection(pool_message(error))
}

fn map_diesel(error: diesel::result::Error) -> AuditLogError {
    map_diesel_error(
        error,
        no_violation,
        AuditLogError::query,
        AuditLogError::connection,
    )
}

/// Half-open `[start, end)` UTC bounds of a calendar month.
fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc();
    let end = start.checked_add_months(Months::new(1))?;
    Some((start, end))
}

fn parse_operation(label: &str) -> Result<ChangeOperation, AuditLogError> {
    match label {
        "add" => Ok(ChangeOperation::Add),
        "delete" => Ok(ChangeOperation::Delete),
        other => Err(AuditLogError::query(format!(
            "unknown audit operation label: {other}"
        ))),
    }
}

fn row_to_entry(row: AuditLogRow) -> Result<AuditEntry, AuditLogError> {
    let AuditLogRow {
        user_id,
        slug,
        operation,
        recorded_at,
    } = row;
    Ok(AuditEntry {
        user_id: user_id_from_column(user_id).map_err(AuditLogError::query)?,
        slug: SegmentSlug::new(slug)
            .map_err(|err| AuditLogError::query(format!("stored slug invalid: {err}")))?,
        operation: parse_operation(&operation)?,
        recorded_at,
    })
}

#[async_trait]
impl AuditLog for DieselAuditLog {
    async fn append(&self, entry: &AuditEntry) -> Result<(), AuditLogError> {
        let user_id = user_id_to_column(entry.user_id).map_err(AuditLogError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(audit_log::table)
            .values(NewAuditLogRow {
                user_id,
                slug: entry.slug.as_ref(),
                operation: entry.operation.label(),
                recorded_at: entry.recorded_at,
            })
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        Ok(())
    }

    async fn entries_for_month(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<AuditEntry>, AuditLogError> {
        let raw_user = user_id_to_column(user_id).map_err(AuditLogError::query)?;
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| AuditLogError::query(format!("invalid month {year}-{month}")))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AuditLogRow> = audit_log::table
            .filter(audit_log::user_id.eq(raw_user))
            .filter(audit_log::recorded_at.ge(start))
            .filter(audit_log::recorded_at.lt(end))
            .order((audit_log::recorded_at.asc(), audit_log::id.asc()))
            .select(AuditLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid time")
    }

    #[rstest]
    #[case(2023, 8, utc(2023, 8, 1), utc(2023, 9, 1))]
    #[case(2023, 12, utc(2023, 12, 1), utc(2024, 1, 1))]
    fn month_bounds_are_half_open(
        #[case] year: i32,
        #[case] month: u32,
        #[case] start: DateTime<Utc>,
        #[case] end: DateTime<Utc>,
    ) {
        assert_eq!(month_bounds(year, month), Some((start, end)));
    }

    #[rstest]
    fn invalid_month_has_no_bounds() {
        assert_eq!(month_bounds(2023, 13), None);
    }

    #[rstest]
    fn rows_decode_with_operation_labels() {
        let entry = row_to_entry(AuditLogRow {
            user_id: 1000,
            slug: "AVITO_30".to_owned(),
            operation: "delete".to_owned(),
            recorded_at: utc(2023, 8, 29),
        })
        .expect("valid row");

        assert_eq!(entry.operation, ChangeOperation::Delete);
        assert_eq!(entry.user_id, UserId::new(1000));
        assert!(parse_operation("rename").is_err());
    }
}
