//! Service graph assembly.
//!
//! [`StorageHandles`] bundles one adapter per storage port, either in memory
//! or backed by PostgreSQL. [`SegmentServices`] builds every domain service
//! on top of a single set of handles so they all share storage, audit, and
//! the clock.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;

use crate::domain::ports::{AuditLog, MembershipRepository, SegmentRepository, UserRepository};
use crate::domain::{
    AuditReportService, ExpirySweeper, MembershipChangeConfig, MembershipChangeService,
    SecureSampler, SegmentService, UserService,
};
use crate::outbound::memory::{InMemoryAuditLog, InMemorySegmentStore};
use crate::outbound::persistence::{
    DbPool, DieselAuditLog, DieselMembershipRepository, DieselSegmentRepository,
    DieselUserRepository,
};

/// One adapter per storage port.
#[derive(Clone)]
pub struct StorageHandles {
    pub segments: Arc<dyn SegmentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub memberships: Arc<dyn MembershipRepository>,
    pub audit: Arc<dyn AuditLog>,
}

impl StorageHandles {
    /// Process-local storage. All three repositories share one store.
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemorySegmentStore::new());
        Self {
            segments: store.clone(),
            users: store.clone(),
            memberships: store,
            audit: Arc::new(InMemoryAuditLog::new()),
        }
    }

    /// PostgreSQL storage sharing `pool` across every adapter.
    pub fn postgres(pool: DbPool) -> Self {
        Self {
            segments: Arc::new(DieselSegmentRepository::new(pool.clone())),
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            memberships: Arc::new(DieselMembershipRepository::new(pool.clone())),
            audit: Arc::new(DieselAuditLog::new(pool)),
        }
    }
}

/// Every domain service, wired to the same storage.
#[derive(Clone)]
pub struct SegmentServices {
    pub changes: MembershipChangeService,
    pub segments: SegmentService,
    pub users: UserService,
    pub reports: AuditReportService,
    pub sweeper: Arc<ExpirySweeper>,
}

impl SegmentServices {
    /// Rollouts draw from [`SecureSampler`].
    pub fn new(
        storage: StorageHandles,
        change_config: MembershipChangeConfig,
        sweep_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let StorageHandles {
            segments,
            users,
            memberships,
            audit,
        } = storage;

        let changes = MembershipChangeService::new(
            memberships.clone(),
            audit.clone(),
            clock.clone(),
            change_config,
        );
        let segment_service = SegmentService::new(
            segments,
            users.clone(),
            audit.clone(),
            changes.clone(),
            Arc::new(SecureSampler),
            clock.clone(),
        );
        let user_service = UserService::new(users, audit.clone(), clock.clone());
        let sweeper = Arc::new(ExpirySweeper::new(
            memberships,
            audit.clone(),
            clock,
            sweep_timeout,
        ));

        Self {
            changes,
            segments: segment_service,
            users: user_service,
            reports: AuditReportService::new(audit),
            sweeper,
        }
    }
}
