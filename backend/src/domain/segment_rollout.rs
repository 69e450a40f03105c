//! Segment lifecycle service: creation with percentage rollout and deletion.
//!
//! Creating a segment may auto-enrol a random share of the current user
//! population. The share is drawn with [`UserSampler`] and applied through
//! [`MembershipChangeService`], so enrolment inherits the orchestrator's
//! per-item isolation. Users whose enrolment fails are left out of the
//! returned list without failing the call.

use std::sync::Arc;

use futures_util::future::join_all;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::audit::append_best_effort;
use crate::domain::membership_changes::MembershipChangeService;
use crate::domain::ports::{AuditLog, SegmentRepository, UserRepository};
use crate::domain::sampler::UserSampler;
use crate::domain::service_support::{map_segment_error, map_user_error};
use crate::domain::{
    AuditEntry, ChangeOperation, Error, MembershipChange, RolloutPercentage, SegmentSlug, UserId,
};

/// Creates and deletes segments.
#[derive(Clone)]
pub struct SegmentService {
    segments: Arc<dyn SegmentRepository>,
    users: Arc<dyn UserRepository>,
    audit: Arc<dyn AuditLog>,
    changes: MembershipChangeService,
    sampler: Arc<dyn UserSampler>,
    clock: Arc<dyn Clock>,
}

impl SegmentService {
    pub fn new(
        segments: Arc<dyn SegmentRepository>,
        users: Arc<dyn UserRepository>,
        audit: Arc<dyn AuditLog>,
        changes: MembershipChangeService,
        sampler: Arc<dyn UserSampler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            segments,
            users,
            audit,
            changes,
            sampler,
            clock,
        }
    }

    /// Create `slug` and enrol `percentage` of all users into it.
    ///
    /// Returns the users actually enrolled. A percentage that rounds down to
    /// zero users enrols nobody and is not an error.
    pub async fn create_with_rollout(
        &self,
        slug: &SegmentSlug,
        percentage: RolloutPercentage,
    ) -> Result<Vec<UserId>, Error> {
        self.segments
            .create_segment(slug)
            .await
            .map_err(map_segment_error)?;

        if percentage.is_zero() {
            info!(%slug, "segment created without rollout");
            return Ok(Vec::new());
        }

        let population = self
            .users
            .list_all_users()
            .await
            .map_err(map_user_error)?;
        let population_size = population.len();
        let target = percentage.target_count(population_size);
        if target == 0 {
            info!(%slug, %percentage, population_size, "rollout rounds down to no users");
            return Ok(Vec::new());
        }

        let selected = if percentage.is_full() {
            population
        } else {
            self.sampler
                .sample(population, target)
                .map_err(|error| Error::internal(error.to_string()))?
        };

        let changes = selected
            .iter()
            .map(|user_id| MembershipChange::add(*user_id, slug.clone(), None))
            .collect();
        let results = self.changes.change(changes).await;

        let enrolled: Vec<UserId> = selected
            .into_iter()
            .zip(results)
            .filter_map(|(user_id, result)| result.is_success().then_some(user_id))
            .collect();
        info!(
            %slug,
            %percentage,
            population_size,
            target,
            enrolled = enrolled.len(),
            "segment rollout applied"
        );
        Ok(enrolled)
    }

    /// Delete `slug` and record one `delete` audit entry per former member.
    ///
    /// Members are read before deletion; if that read fails the segment is
    /// still deleted but no audit entries are written.
    pub async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), Error> {
        let members = match self.segments.list_users_by_segment(slug).await {
            Ok(members) => members,
            Err(error) => {
                warn!(%slug, %error, "failed to read segment members; deletion will not be audited");
                Vec::new()
            }
        };

        self.segments
            .delete_segment(slug)
            .await
            .map_err(map_segment_error)?;

        let recorded_at = self.clock.utc();
        let audit = self.audit.as_ref();
        join_all(members.iter().map(|user_id| {
            append_best_effort(
                audit,
                AuditEntry {
                    user_id: *user_id,
                    slug: slug.clone(),
                    operation: ChangeOperation::Delete,
                    recorded_at,
                },
            )
        }))
        .await;

        info!(%slug, former_members = members.len(), "segment deleted");
        Ok(())
    }
}
