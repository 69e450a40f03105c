//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the storage and audit ports backed by
//! PostgreSQL via Diesel, with async support through `diesel-async` and `bb8`
//! connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Constraint-backed invariants**: membership uniqueness and referential
//!   integrity are enforced by the schema and surfaced as port variants.
//!
//! # Example
//!
//! ```ignore
//! use segments::outbound::persistence::{DbPool, DieselMembershipRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/segments")).await?;
//! let memberships = DieselMembershipRepository::new(pool);
//! ```

mod diesel_audit_log;
mod diesel_membership_repository;
mod diesel_segment_repository;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_audit_log::DieselAuditLog;
pub use diesel_membership_repository::DieselMembershipRepository;
pub use diesel_segment_repository::DieselSegmentRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
