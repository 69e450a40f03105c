//! Port for membership row persistence.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ExpiredMembership, Membership, SegmentSlug, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by membership repository adapters.
    pub enum MembershipRepositoryError {
        /// The referenced segment does not exist.
        SegmentNotFound => "specified segment doesn't exist",
        /// A membership for the same (user, slug) pair already exists.
        AlreadyMember => "user already has specified segment",
        /// No membership exists for the (user, slug) pair.
        MembershipNotFound => "user doesn't have specified segment",
        /// Repository connection could not be established.
        Connection { message: String } =>
            "membership repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "membership repository query failed: {message}",
    }
}

/// Port for mutating membership rows.
///
/// Calls may arrive concurrently from many tasks; the uniqueness of
/// (user, slug) must hold under that concurrency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Insert a membership row.
    async fn add_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), MembershipRepositoryError>;

    /// Remove the membership row for `user_id` in `slug`.
    async fn delete_membership(
        &self,
        user_id: UserId,
        slug: &SegmentSlug,
    ) -> Result<(), MembershipRepositoryError>;

    /// Atomically delete every membership whose expiry is before `now` and
    /// return the removed pairs.
    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredMembership>, MembershipRepositoryError>;
}
