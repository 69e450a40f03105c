//! User registration, removal, and segment listing.

use std::sync::Arc;

use futures_util::future::join_all;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::audit::append_best_effort;
use crate::domain::ports::{AuditLog, UserRepository};
use crate::domain::service_support::map_user_error;
use crate::domain::{AuditEntry, ChangeOperation, Error, SegmentSlug, UserId};

/// Manages the users known to the segment store.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { users, audit, clock }
    }

    /// Register a user. Registering the same id twice is a conflict.
    pub async fn create_user(&self, user_id: UserId) -> Result<(), Error> {
        self.users
            .create_user(user_id)
            .await
            .map_err(map_user_error)?;
        info!(%user_id, "user created");
        Ok(())
    }

    /// Remove a user and record one `delete` audit entry per segment the
    /// user belonged to.
    pub async fn delete_user(&self, user_id: UserId) -> Result<(), Error> {
        let segments = match self.users.list_user_segments(user_id).await {
            Ok(segments) => segments,
            Err(error) => {
                warn!(%user_id, %error, "failed to read user segments; deletion will not be audited");
                Vec::new()
            }
        };

        self.users
            .delete_user(user_id)
            .await
            .map_err(map_user_error)?;

        let recorded_at = self.clock.utc();
        let audit = self.audit.as_ref();
        join_all(segments.iter().map(|slug| {
            append_best_effort(
                audit,
                AuditEntry {
                    user_id,
                    slug: slug.clone(),
                    operation: ChangeOperation::Delete,
                    recorded_at,
                },
            )
        }))
        .await;

        info!(%user_id, former_segments = segments.len(), "user deleted");
        Ok(())
    }

    /// List the segments `user_id` currently belongs to.
    pub async fn user_segments(&self, user_id: UserId) -> Result<Vec<SegmentSlug>, Error> {
        self.users
            .list_user_segments(user_id)
            .await
            .map_err(map_user_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{MockAuditLog, MockUserRepository, UserRepositoryError};
    use crate::test_support::clock::MutableClock;
    use rstest::rstest;

    fn service(users: MockUserRepository, audit: MockAuditLog) -> UserService {
        UserService::new(
            Arc::new(users),
            Arc::new(audit),
            Arc::new(MutableClock::at_fixed_instant()),
        )
    }

    fn slugs(raw: &[&str]) -> Vec<SegmentSlug> {
        raw.iter()
            .map(|value| SegmentSlug::new(*value).expect("valid slug"))
            .collect()
    }

    #[rstest]
    #[case(Ok(()), None)]
    #[case(Err(UserRepositoryError::user_exists()), Some(ErrorCode::Conflict))]
    #[tokio::test]
    async fn create_user_maps_repository_outcome(
        #[case] outcome: Result<(), UserRepositoryError>,
        #[case] expected: Option<ErrorCode>,
    ) {
        let mut users = MockUserRepository::new();
        users
            .expect_create_user()
            .withf(|user_id| *user_id == UserId::new(1000))
            .times(1)
            .return_once(move |_| outcome);

        let result = service(users, MockAuditLog::new())
            .create_user(UserId::new(1000))
            .await;

        assert_eq!(result.err().map(|error| error.code()), expected);
    }

    #[tokio::test]
    async fn delete_user_audits_each_former_segment() {
        let mut users = MockUserRepository::new();
        users
            .expect_list_user_segments()
            .return_once(|_| Ok(slugs(&["alpha", "beta", "gamma"])));
        users.expect_delete_user().times(1).return_once(|_| Ok(()));
        let mut audit = MockAuditLog::new();
        audit
            .expect_append()
            .withf(|entry| {
                entry.user_id == UserId::new(7) && entry.operation == ChangeOperation::Delete
            })
            .times(3)
            .returning(|_| Ok(()));

        service(users, audit)
            .delete_user(UserId::new(7))
            .await
            .expect("user deleted");
    }

    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let mut users = MockUserRepository::new();
        users
            .expect_list_user_segments()
            .return_once(|_| Err(UserRepositoryError::user_not_found()));
        users
            .expect_delete_user()
            .return_once(|_| Err(UserRepositoryError::user_not_found()));
        let mut audit = MockAuditLog::new();
        audit.expect_append().times(0);

        let error = service(users, audit)
            .delete_user(UserId::new(7))
            .await
            .expect_err("unknown user");

        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn user_segments_are_listed() {
        let mut users = MockUserRepository::new();
        users
            .expect_list_user_segments()
            .return_once(|_| Ok(slugs(&["AVITO_10", "AVITO_30"])));

        let listed = service(users, MockAuditLog::new())
            .user_segments(UserId::new(1))
            .await
            .expect("listed");

        assert_eq!(listed, slugs(&["AVITO_10", "AVITO_30"]));
    }
}
