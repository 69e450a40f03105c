//! Process-local segment store implementing every storage port.
//!
//! All tables sit behind one `Mutex`, so each port call is atomic with
//! respect to every other call. No lock is held across an `.await`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::ports::{
    MembershipRepository, MembershipRepositoryError, SegmentRepository, SegmentRepositoryError,
    UserRepository, UserRepositoryError,
};
use crate::domain::{ExpiredMembership, Membership, SegmentSlug, UserId};

const POISONED: &str = "in-memory store lock poisoned";

#[derive(Debug, Default)]
struct Tables {
    users: BTreeSet<UserId>,
    segments: BTreeSet<SegmentSlug>,
    memberships: BTreeMap<(UserId, SegmentSlug), Option<DateTime<Utc>>>,
}

impl Tables {
    fn members_of(&self, slug: &SegmentSlug) -> Vec<UserId> {
        self.memberships
            .keys()
            .filter(|(_, member_slug)| member_slug == slug)
            .map(|(user_id, _)| *user_id)
            .collect()
    }
}

/// In-memory segment, user, and membership tables.
///
/// Memberships reference both a registered user and an existing segment;
/// deleting either cascades to its memberships.
#[derive(Debug, Default)]
pub struct InMemorySegmentStore {
    tables: Mutex<Tables>,
}

impl InMemorySegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current membership rows, ordered by user then slug.
    pub fn memberships(&self) -> Vec<Membership> {
        self.lock()
            .map(|tables| {
                tables
                    .memberships
                    .iter()
                    .map(|((user_id, slug), expires_at)| Membership {
                        user_id: *user_id,
                        slug: slug.clone(),
                        expires_at: *expires_at,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, &'static str> {
        self.tables.lock().map_err(|_| POISONED)
    }
}

#[async_trait]
impl SegmentRepository for InMemorySegmentStore {
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut tables = self.lock().map_err(SegmentRepositoryError::connection)?;
        if !tables.segments.insert(slug.clone()) {
            return Err(SegmentRepositoryError::segment_exists());
        }
        Ok(())
    }

    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError> {
        let mut tables = self.lock().map_err(SegmentRepositoryError::connection)?;
        if !tables.segments.remove(slug) {
            return Err(SegmentRepositoryError::segment_not_found());
        }
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|(_, member_slug), _| member_slug != slug);
        debug!(%slug, cascaded = before - tables.memberships.len(), "segment removed");
        Ok(())
    }

    async fn list_users_by_segment(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Vec<UserId>, SegmentRepositoryError> {
        let tables = self.lock().map_err(SegmentRepositoryError::connection)?;
        if !tables.segments.contains(slug) {
            return Err(SegmentRepositoryError::segment_not_found());
        }
        Ok(tables.members_of(slug))
    }
}

#[async_trait]
impl MembershipRepository for InMemorySegmentStore {
    async fn add_membership(
        &self,
        membership: &Membership,
    ) -> Result<(), MembershipRepositoryError> {
        let mut tables = self.lock().map_err(MembershipRepositoryError::connection)?;
        if !tables.segments.contains(&membership.slug) {
            return Err(MembershipRepositoryError::segment_not_found());
        }
        if !tables.users.contains(&membership.user_id) {
            return Err(MembershipRepositoryError::query(format!(
                "user {} is not registered",
                membership.user_id
            )));
        }
        let key = (membership.user_id, membership.slug.clone());
        if tables.memberships.contains_key(&key) {
            return Err(MembershipRepositoryError::already_member());
        }
        tables.memberships.insert(key, membership.expires_at);
        Ok(())
    }

    async fn delete_membership(
        &self,
        user_id: UserId,
        slug: &SegmentSlug,
    ) -> Result<(), MembershipRepositoryError> {
        let mut tables = self.lock().map_err(MembershipRepositoryError::connection)?;
        if !tables.segments.contains(slug) {
            return Err(MembershipRepositoryError::segment_not_found());
        }
        tables
            .memberships
            .remove(&(user_id, slug.clone()))
            .map(|_| ())
            .ok_or_else(MembershipRepositoryError::membership_not_found)
    }

    async fn sweep_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExpiredMembership>, MembershipRepositoryError> {
        let mut tables = self.lock().map_err(MembershipRepositoryError::connection)?;
        let expired: Vec<ExpiredMembership> = tables
            .memberships
            .iter()
            .filter(|(_, expires_at)| expires_at.is_some_and(|expiry| expiry < now))
            .map(|((user_id, slug), _)| ExpiredMembership {
                user_id: *user_id,
                slug: slug.clone(),
            })
            .collect();
        for membership in &expired {
            tables
                .memberships
                .remove(&(membership.user_id, membership.slug.clone()));
        }
        Ok(expired)
    }
}

#[async_trait]
impl UserRepository for InMemorySegmentStore {
    async fn create_user(&self, user_id: UserId) -> Result<(), UserRepositoryError> {
        let mut tables = self.lock().map_err(UserRepositoryError::connection)?;
        if !tables.users.insert(user_id) {
            return Err(UserRepositoryError::user_exists());
        }
        Ok(())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<(), UserRepositoryError> {
        let mut tables = self.lock().map_err(UserRepositoryError::connection)?;
        if !tables.users.remove(&user_id) {
            return Err(UserRepositoryError::user_not_found());
        }
        tables
            .memberships
            .retain(|(member_id, _), _| *member_id != user_id);
        Ok(())
    }

    async fn list_all_users(&self) -> Result<Vec<UserId>, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::connection)?;
        Ok(tables.users.iter().copied().collect())
    }

    async fn list_user_segments(
        &self,
        user_id: UserId,
    ) -> Result<Vec<SegmentSlug>, UserRepositoryError> {
        let tables = self.lock().map_err(UserRepositoryError::connection)?;
        if !tables.users.contains(&user_id) {
            return Err(UserRepositoryError::user_not_found());
        }
        Ok(tables
            .memberships
            .keys()
            .filter(|(member_id, _)| *member_id == user_id)
            .map(|(_, slug)| slug.clone())
            .collect())
    }
}
