//! PostgreSQL-backed `SegmentRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{SegmentRepository, SegmentRepositoryError};
use crate::domain::{SegmentSlug, UserId};

use super::error_mapping::{Violation, map_diesel_error, no_violation, pool_message};
use super::models::{NewSegmentRow, user_id_from_column};
use super::pool::{DbPool, PoolError};
use super::schema::{segments, users_segments};

/// Diesel-backed implementation of the segment repository port.
#[derive(Clone)]
pub struct DieselSegmentRepository {
    pool: DbPool,
}

impl DieselSegmentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> SegmentRepositoryError {
    SegmentRepositoryError::connection(pool_message(error))
}

fn map_write_error(error: diesel::result::Error) -> SegmentRepositoryError {
    map_diesel_error(
        error,
        |violation| match violation {
            Violation::Unique => Some(SegmentRepositoryError::segment_exists()),
            Violation::ForeignKey(_) => None,
        },
        SegmentRepositoryError::query,
        SegmentRepositoryError::connection,
    )
}

fn map_read_error(error: diesel::result::Error) -> SegmentRepositoryError {
    map_diesel_error(
        error,
        no_violation,
        SegmentRepositoryError::query,
        SegmentRepositoryError::connection,
    )
}

pub(crate) async fn segment_exists(
    conn: &mut AsyncPgConnection,
    slug: &SegmentSlug,
) -> Result<bool, diesel::result::Error> {
    diesel::select(exists(segments::table.find(slug.as_ref())))
        .get_result(conn)
        .await
}

#[async_trait]
impl SegmentRepository for DieselSegmentRepository {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(segments::table)
            .values(NewSegmentRow {
                slug: slug.as_ref(),
            })
            .execute(&mut conn)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(segments::table.find(slug.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(map_write_error)?;
        if deleted == 0 {
            return Err(SegmentRepositoryError::segment_not_found());
        }
        Ok(())
    }

    async fn list_users_by_segment(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Vec<UserId>, SegmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        if !segment_exists(&mut conn, slug)
            .await
            .map_err(map_read_error)?
        {
            return Err(SegmentRepositoryError::segment_not_found());
        }

        let rows: Vec<i64> = users_segments::table
            .filter(users_segments::slug.eq(slug.as_ref()))
            .select(users_segments::user_id)
            .order(users_segments::user_id.asc())
            .load(&mut conn)
            .await
            .map_err(map_read_error)?;
        rows.into_iter()
            .map(|raw| user_id_from_column(raw).map_err(SegmentRepositoryError::query))
            .collect()
    }
}
