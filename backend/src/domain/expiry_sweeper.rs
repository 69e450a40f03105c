//! Periodic removal of expired memberships.
//!
//! One sweep asks storage to delete every membership whose expiry is in the
//! past, then writes a best-effort `delete` audit entry per removed pair.
//! Each sweep carries its own deadline. A sweep that overruns it is
//! abandoned and the next tick starts fresh.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use mockable::Clock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval, timeout_at};
use tracing::{debug, info, warn};

use crate::domain::audit::append_best_effort;
use crate::domain::ports::{AuditLog, MembershipRepository};
use crate::domain::service_support::map_membership_error;
use crate::domain::{AuditEntry, ChangeOperation, Error};

/// Expires time-limited memberships.
pub struct ExpirySweeper {
    memberships: Arc<dyn MembershipRepository>,
    audit: Arc<dyn AuditLog>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl ExpirySweeper {
    /// `timeout` bounds each individual sweep.
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Self {
        Self {
            memberships,
            audit,
            clock,
            timeout,
        }
    }

    /// Run one sweep and return the number of memberships removed.
    ///
    /// Fails only when the storage deletion fails or overruns the deadline.
    /// Audit failures are logged and dropped.
    pub async fn sweep_once(&self) -> Result<usize, Error> {
        let deadline = Instant::now() + self.timeout;
        let now = self.clock.utc();

        let expired = timeout_at(deadline, self.memberships.sweep_expired(now))
            .await
            .map_err(|_| Error::service_unavailable("expiry sweep exceeded its deadline"))?
            .map_err(map_membership_error)?;

        if expired.is_empty() {
            debug!("no expired memberships");
            return Ok(0);
        }

        let audit = self.audit.as_ref();
        let appends = join_all(expired.iter().map(|membership| {
            append_best_effort(
                audit,
                AuditEntry {
                    user_id: membership.user_id,
                    slug: membership.slug.clone(),
                    operation: ChangeOperation::Delete,
                    recorded_at: now,
                },
            )
        }));
        if timeout_at(deadline, appends).await.is_err() {
            warn!(
                removed = expired.len(),
                "expiry audit entries abandoned at sweep deadline"
            );
        }

        info!(removed = expired.len(), "expired memberships removed");
        Ok(expired.len())
    }

    /// Run [`Self::sweep_once`] every `period` until `shutdown` flips to
    /// `true` or its sender is dropped.
    ///
    /// The first sweep runs immediately. Missed ticks are skipped rather than
    /// replayed, so a slow sweep never causes a burst of catch-up sweeps.
    pub fn spawn(
        self: Arc<Self>,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(interval_secs = period.as_secs(), "expiry sweeper started");
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(error) = self.sweep_once().await {
                            warn!(%error, "expiry sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("expiry sweeper stopped");
        })
    }
}
