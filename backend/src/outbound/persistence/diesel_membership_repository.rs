//! PostgreSQL-backed `MembershipRepository` implementation using Diesel ORM.
//!
//! Uniqueness of (user, slug) is enforced by the table's primary key, so
//! concurrent duplicate adds resolve to exactly one insert and one
//! `AlreadyMember` rejection.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MembershipRepository, MembershipRepositoryError};
use crate::domain::{ExpiredMembership, Membership, SegmentSlug, UserId};

use super::diesel_segment_repository::segment_exists;
use super::error_mapping::{Violation, map_diesel_error, no_violation, pool_message};
use super::models::{NewMembershipRow, user_id_from_column, user_id_to_column};
use super::pool::{DbPool, PoolError};
use super::schema::users_segments;

/// Diesel-backed implementation of the membership repository port.
#[derive(Clone)]
pub struct DieselMembershipRepository {
    pool: DbPool,
}

impl DieselMembershipRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> MembershipRepositoryError {
    MembershipRepositoryError::connection(pool_message(error))
}

fn map_insert_error(error: diesel::result::Error) -> MembershipRepositoryError {
    map_diesel_error(
        error,
        |violation| match violation {
            Violation::Unique => Some(MembershipRepositoryError::already_member()),
            Violation::ForeignKey(Some(constraint)) if constraint.contains("slug") => {
                Some(MembershipRepositoryError::segment_not_found())
            }
            Violation::ForeignKey(Some(constraint)) if constraint.contains("user_id") => Some(
                MembershipRepositoryError::query("user with specified id doesn't exist"),
            ),
            Violation::ForeignKey(_) => None,
        },
        MembershipRepositoryError::query,
        MembershipRepositoryError::connection,
    )
}

fn map_diesel(error: diesel::result::Error) -> MembershipRepositoryError {
    map_diesel_error(
        error,
        no_violation,
        MembershipRepositoryError::query,
        MembershipRepositoryError::connection,
    )
}

fn decode_expired(
    (raw_user, raw_slug): (i64, String),
) -> Result<ExpiredMembership, MembershipRepositoryError> {
    let user_id = user_id_from_column(raw_user).map_err(MembershipRepositoryError::query)?;
    let slug = SegmentSlug::new(raw_slug)
        .map_err(|err| MembershipRepositoryError::query(format!("stored slug invalid: {err}")))?;
    Ok(ExpiredMembership { user_id, slug })
}

#[async_trait]
impl MembershipRepository for DieselMembershipRepository {
    async fn add_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), MembershipRepositoryError> {
        let user_id =
            user_id_to_column(membership.user_id).map_err(MembershipRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users_segments::table)
            .values(NewMembershipRow {
                user_id,
                slug: membership.slug.as_ref(),
                expires_at: membership.expires_at,
            })
            .execute(&mut conn)
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn delete_membership(
        &self,
        user_id: UserId,
        slug: &SegmentSlug,
    ) -> Result<(), MembershipRepositoryError> {
        let raw_user = user_id_to_column(user_id).map_err(MembershipRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users_segments::table.find((raw_user, slug.as_ref())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        if deleted > 0 {
            return Ok(());
        }

        if segment_exists(&mut conn, slug).await.map_err(map_diesel)? {
            Err(MembershipRepositoryError::membership_not_found())
        } else {
            Err(MembershipRepositoryError::segment_not_found())
        }
    }

    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredMembership>, MembershipRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed: Vec<(i64, String)> =
            diesel::delete(users_segments::table.filter(users_segments::expires_at.lt(now)))
                .returning((users_segments::user_id, users_segments::slug))
                .get_results(&mut conn)
                .await
                .map_err(map_diesel)?;
        removed.into_iter().map(decode_expired).collect()
    }
}
