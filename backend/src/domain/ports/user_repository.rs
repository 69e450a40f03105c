//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;

use crate::domain::{SegmentSlug, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// A user with the same identifier already exists.
        UserExists => "user with specified id already exists",
        /// No user with the given identifier exists.
        UserNotFound => "user with specified id doesn't exist",
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Register a user identifier.
    async fn create_user(&self, user_id: UserId) -> Result<(), UserRepositoryError>;

    /// Remove a user, cascading removal of their memberships.
    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepositoryError>;

    /// List every known user identifier.
    async fn list_all_users(&self) -> Result<Vec<UserId>, UserRepositoryError>;

    /// List the slugs of segments the user currently belongs to.
    async fn list_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, UserRepositoryError>;
}
