//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::UserId;

use super::schema::{audit_log, segments, users, users_segments};

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = segments)]
pub(crate) struct NewSegmentRow<'a> {
    pub slug: &'a str,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow {
    pub id: i64,
}

/// Insertable membership row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users_segments)]
pub(crate) struct NewMembershipRow<'a> {
    pub user_id: i64,
    pub slug: &'a str,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Row struct for reading from the audit_log table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuditLogRow {
    pub user_id: i64,
    pub slug: String,
    pub operation: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_log)]
pub(crate) struct NewAuditLogRow<'a> {
    pub user_id: i64,
    pub slug: &'a str,
    pub operation: &'a str,
    pub recorded_at: DateTime<Utc>,
}

/// Convert a domain user id into the signed `BIGINT` column type.
pub(crate) fn user_id_to_column(user_id: UserId) -> Result<i64, String> {
    i64::try_from(user_id.get()).map_err(|_| format!("user id {user_id} exceeds BIGINT range"))
}

/// Convert a `BIGINT` column value back into a domain user id.
pub(crate) fn user_id_from_column(raw: i64) -> Result<UserId, String> {
    u64::try_from(raw)
        .map(UserId::new)
        .map_err(|_| format!("stored user id {raw} is negative"))
}
