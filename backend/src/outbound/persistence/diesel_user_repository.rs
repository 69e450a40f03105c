//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{SegmentSlug, UserId};

use super::error_mapping::{Violation, map_diesel_error, pool_message};
use super::models::{NewUserRow, user_id_from_column, user_id_to_column};
use super::pool::{DbPool, PoolError};
use super::schema::{users, users_segments};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserRepositoryError {
    UserRepositoryError::connection(pool_message(error))
}

fn map_diesel(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        |violation| match violation {
            Violation::Unique => Some(UserRepositoryError::user_exists()),
            Violation::ForeignKey(_) => None,
        },
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_user(&self, user_id: UserId) -> Result<(), UserRepositoryError> {
        let id = user_id_to_column(user_id).map_err(UserRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow { id })
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepositoryError> {
        let id = user_id_to_column(user_id).map_err(UserRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(users::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel)?;
        if deleted == 0 {
            return Err(UserRepositoryError::user_not_found());
        }
        Ok(())
    }

    async fn list_all_users(&self) -> Result<Vec<UserId>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<i64> = users::table
            .select(users::id)
            .order(users::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter()
            .map(|raw| user_id_from_column(raw).map_err(UserRepositoryError::query))
            .collect()
    }

    async fn list_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, UserRepositoryError> {
        let id = user_id_to_column(user_id).map_err(UserRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let known: bool = diesel::select(exists(users::table.find(id)))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;
        if !known {
            return Err(UserRepositoryError::user_not_found());
        }

        let rows: Vec<String> = users_segments::table
            .filter(users_segments::user_id.eq(id))
            .select(users_segments::slug)
            .order(users_segments::slug.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;
        rows.into_iter()
            .map(|raw| {
                SegmentSlug::new(raw).map_err(|err| {
                    UserRepositoryError::query(format!("stored slug invalid: {err}"))
                })
            })
            .collect()
    }
}
