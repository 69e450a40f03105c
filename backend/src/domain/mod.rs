//! Domain primitives, services, and ports.
//!
//! Purpose: Define strongly typed segment membership entities and the
//! services that orchestrate them. Storage and audit collaborators are
//! reached only through the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`) — transport-agnostic failure payload.
//! - UserId, SegmentSlug, MembershipTtl, RolloutPercentage — validated
//!   value types.
//! - MembershipChangeService — concurrent batch change orchestrator.
//! - ExpirySweeper — periodic expired membership removal.
//! - SegmentService — segment creation with percentage rollout.
//! - UserService, AuditReportService — user lifecycle and audit reports.

pub(crate) mod audit;
pub mod audit_report;
pub mod error;
pub mod expiry_sweeper;
pub mod membership;
pub mod membership_changes;
pub mod percentage;
pub mod ports;
pub mod sampler;
pub mod segment_rollout;
pub(crate) mod service_support;
pub mod slug;
pub mod ttl;
pub mod user;
pub mod user_service;

pub use self::audit::AuditEntry;
pub use self::audit_report::AuditReportService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::expiry_sweeper::ExpirySweeper;
pub use self::membership::{
    ChangeFailure, ChangeOperation, ChangeResult, ExpiredMembership, Membership,
    MembershipChange,
};
pub use self::membership_changes::{MembershipChangeConfig, MembershipChangeService, SegmentGrant};
pub use self::percentage::{PercentageValidationError, RolloutPercentage};
pub use self::sampler::{SampleError, SecureSampler, UserSampler, select, select_with};
pub use self::segment_rollout::SegmentService;
pub use self::slug::{SLUG_MAX, SegmentSlug, SlugValidationError};
pub use self::ttl::{MembershipTtl, TtlError};
pub use self::user::{UserId, UserValidationError};
pub use self::user_service::UserService;
