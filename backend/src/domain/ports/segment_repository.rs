//! Port for segment lifecycle persistence.
use async_trait::async_trait;

use crate::domain::{SegmentSlug, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by segment repository adapters.
    pub enum SegmentRepositoryError {
        /// A segment with the same slug already exists.
        SegmentExists => "specified segment already exists",
        /// No segment with the given slug exists.
        SegmentNotFound => "specified segment doesn't exist",
        /// Repository connection could not be established.
        Connection { message: String } => "segment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "segment repository query failed: {message}",
    }
}

/// Port for creating, deleting, and inspecting segments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentRepository: Send + Sync {
    /// Create a segment record.
    async fn create_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError>;

    /// Delete a segment record, cascading removal of its memberships.
    async fn delete_segment(&self, slug: &SegmentSlug) -> Result<(), SegmentRepositoryError>;

    /// List users currently enrolled in the segment.
    async fn list_users_by_segment(
        &self,
        slug: &SegmentSlug,
    ) -> Result<Vec<UserId>, SegmentRepositoryError>;
}
