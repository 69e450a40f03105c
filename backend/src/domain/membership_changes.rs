//! Batch membership change orchestration.
//!
//! Each item of a batch runs as its own tokio task against the shared
//! storage handle. Tasks never share mutable state: every task owns its
//! input and is joined back into the output slot matching its input index.
//! One failing item (domain rejection, storage failure, panic, or deadline)
//! resolves to a failure outcome for that item only. The call returns after
//! every task has been joined.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use mockable::Clock;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info};

use crate::domain::audit::append_best_effort;
use crate::domain::ports::{AuditLog, MembershipRepository};
use crate::domain::{
    AuditEntry, ChangeFailure, ChangeOperation, ChangeResult, Error, MembershipChange,
    MembershipTtl, SegmentSlug, UserId,
};

/// Limits applied to every batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChangeConfig {
    /// Maximum number of items touching storage at once, across all batches
    /// served by one service instance.
    pub max_concurrent_changes: usize,
    /// Wall-clock budget for a whole batch.
    pub batch_timeout: Duration,
}

impl Default for MembershipChangeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_changes: 64,
            batch_timeout: Duration::from_secs(10),
        }
    }
}

/// Segment to add for a user, with an optional TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentGrant {
    pub slug: SegmentSlug,
    pub ttl: Option<MembershipTtl>,
}

/// Handles cloned into every per-item task.
#[derive(Clone)]
struct ChangeContext {
    memberships: Arc<dyn MembershipRepository>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    permits: Arc<Semaphore>,
}

impl ChangeContext {
    async fn apply(self, change: MembershipChange, deadline: Instant) -> Result<(), ChangeFailure> {
        let outcome = match timeout_at(deadline, self.mutate(&change)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(ChangeFailure::DeadlineExceeded),
        };

        match &outcome {
            Ok(()) => {
                let entry = AuditEntry {
                    user_id: change.user_id,
                    slug: change.slug.clone(),
                    operation: change.operation,
                    recorded_at: self.clock.utc(),
                };
                if timeout_at(deadline, append_best_effort(self.audit.as_ref(), entry))
                    .await
                    .is_err()
                {
                    debug!(
                        user_id = %change.user_id,
                        slug = %change.slug,
                        "audit append abandoned at batch deadline"
                    );
                }
            }
            Err(failure) => {
                debug!(
                    user_id = %change.user_id,
                    slug = %change.slug,
                    operation = %change.operation,
                    %failure,
                    "membership change rejected"
                );
            }
        }
        outcome
    }

    async fn mutate(&self, change: &MembershipChange) -> Result<(), ChangeFailure> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ChangeFailure::Aborted {
                message: "change permits closed".to_owned(),
            })?;

        let result = match change.operation {
            ChangeOperation::Add => self.memberships.add_membership(&change.to_membership()).await,
            ChangeOperation::Delete => {
                self.memberships
                    .delete_membership(change.user_id, &change.slug)
                    .await
            }
        };
        result.map_err(ChangeFailure::from)
    }
}

/// Batch change orchestrator.
#[derive(Clone)]
pub struct MembershipChangeService {
    context: ChangeContext,
    config: MembershipChangeConfig,
}

impl MembershipChangeService {
    /// Build the service around shared storage and audit handles.
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
        config: MembershipChangeConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_changes.max(1)));
        Self {
            context: ChangeContext {
                memberships,
                audit,
                clock,
                permits,
            },
            config,
        }
    }

    /// Apply every change concurrently and return one result per item, in
    /// input order.
    ///
    /// ```rust,ignore
    /// let results = service.change(vec![MembershipChange::add(user, slug, None)]).await;
    /// assert_eq!(results.len(), 1);
    /// ```
    pub async fn change(&self, changes: Vec<MembershipChange>) -> Vec<ChangeResult> {
        let deadline = Instant::now() + self.config.batch_timeout;
        let labels: Vec<(ChangeOperation, SegmentSlug)> = changes
            .iter()
            .map(|change| (change.operation, change.slug.clone()))
            .collect();

        let handles: Vec<_> = changes
            .into_iter()
            .map(|change| tokio::spawn(self.context.clone().apply(change, deadline)))
            .collect();
        let joined = join_all(handles).await;

        let results: Vec<ChangeResult> = joined
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(index, (joined, (operation, slug)))| {
                let outcome = joined.unwrap_or_else(|error| {
                    Err(ChangeFailure::Aborted {
                        message: error.to_string(),
                    })
                });
                ChangeResult {
                    index,
                    operation,
                    slug,
                    outcome,
                }
            })
            .collect();

        let succeeded = results.iter().filter(|result| result.is_success()).count();
        info!(
            total = results.len(),
            succeeded,
            failed = results.len() - succeeded,
            "membership batch applied"
        );
        results
    }

    /// Add and remove segments for one user.
    ///
    /// TTLs resolve against the service clock. Adds run as one batch, then
    /// deletes as a second batch; add results precede delete results.
    pub async fn change_user_segments(
        &self,
        user_id: UserId,
        to_add: Vec<SegmentGrant>,
        to_delete: Vec<SegmentSlug>,
    ) -> Result<Vec<ChangeResult>, Error> {
        if to_add.is_empty() && to_delete.is_empty() {
            return Err(Error::invalid_request(
                "invalid data to change user's segments",
            ));
        }

        let now = self.context.clock.utc();
        let adds = to_add
            .into_iter()
            .map(|grant| {
                let expires_at = resolve_expiry(grant.ttl, now)?;
                Ok(MembershipChange::add(user_id, grant.slug, expires_at))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let deletes = to_delete
            .into_iter()
            .map(|slug| MembershipChange::delete(user_id, slug))
            .collect();

        let mut results = self.change(adds).await;
        let offset = results.len();
        results.extend(self.change(deletes).await.into_iter().map(|mut result| {
            result.index += offset;
            result
        }));
        Ok(results)
    }
}

fn resolve_expiry(
    ttl: Option<MembershipTtl>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, Error> {
    ttl.map(|ttl| ttl.expires_at(now))
        .transpose()
        .map_err(|error| Error::invalid_request(error.to_string()))
}
