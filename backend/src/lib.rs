//! Segment membership orchestration library.
//!
//! The [`domain`] module holds the membership model, the batch change
//! orchestrator, the expiry sweeper, the rollout sampler, and the ports they
//! reach storage through. [`outbound`] provides in-memory and PostgreSQL
//! adapters for those ports. [`config`] loads service settings and
//! [`services`] assembles the service graph.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod services;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
