//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Storage and audit collaborators are reached only through these traits.
//! Implementations must tolerate concurrent calls from many tasks sharing
//! one handle; pooling or serialising connections is the adapter's job.

mod macros;
pub(crate) use macros::define_port_error;

mod audit_log;
mod membership_repository;
mod segment_repository;
mod user_repository;

#[cfg(test)]
pub use audit_log::MockAuditLog;
pub use audit_log::{AuditLog, AuditLogError, NoOpAuditLog};
#[cfg(test)]
pub use membership_repository::MockMembershipRepository;
pub use membership_repository::{MembershipRepository, MembershipRepositoryError};
#[cfg(test)]
pub use segment_repository::MockSegmentRepository;
pub use segment_repository::{SegmentRepository, SegmentRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
