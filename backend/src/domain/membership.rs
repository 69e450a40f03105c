//! Segment membership model and batch change types.
//!
//! A membership ties one user to one segment, optionally until an expiry
//! instant. Storage guarantees at most one membership per (user, slug) pair;
//! duplicate adds are rejected rather than merged.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::MembershipRepositoryError;
use crate::domain::{SegmentSlug, UserId};

/// Kind of membership mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOperation {
    /// Enrol the user into the segment.
    Add,
    /// Remove the user from the segment.
    Delete,
}

impl ChangeOperation {
    /// Stable label written to the audit log.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted membership row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub user_id: UserId,
    pub slug: SegmentSlug,
    /// `None` means the membership is permanent.
    pub expires_at: Option<DateTime<Utc>>,
}

/// (user, slug) pair removed by an expiry sweep.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiredMembership {
    pub user_id: UserId,
    pub slug: SegmentSlug,
}

/// One requested membership mutation inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub user_id: UserId,
    pub slug: SegmentSlug,
    pub operation: ChangeOperation,
    /// Only meaningful for [`ChangeOperation::Add`].
    pub expires_at: Option<DateTime<Utc>>,
}

impl MembershipChange {
    /// Request enrolment of `user_id` into `slug`.
    pub fn add(user_id: UserId, slug: SegmentSlug, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id,
            slug,
            operation: ChangeOperation::Add,
            expires_at,
        }
    }

    /// Request removal of `user_id` from `slug`.
    pub fn delete(user_id: UserId, slug: SegmentSlug) -> Self {
        Self {
            user_id,
            slug,
            operation: ChangeOperation::Delete,
            expires_at: None,
        }
    }

    pub(crate) fn to_membership(&self) -> Membership {
        Membership {
            user_id: self.user_id,
            slug: self.slug.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// Reason a single batch item failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChangeFailure {
    /// The referenced segment does not exist.
    #[error("specified segment doesn't exist")]
    SegmentNotFound,
    /// The user already belongs to the segment.
    #[error("user already has specified segment")]
    AlreadyMember,
    /// The user does not belong to the segment.
    #[error("user doesn't have specified segment")]
    MembershipNotFound,
    /// Storage failed for reasons unrelated to the item's content.
    #[error("membership storage failed: {message}")]
    Storage { message: String },
    /// The batch deadline elapsed before the item completed.
    #[error("membership change exceeded the batch deadline")]
    DeadlineExceeded,
    /// The worker task for this item stopped before producing an outcome.
    #[error("membership change task aborted: {message}")]
    Aborted { message: String },
}

impl ChangeFailure {
    /// Return `true` for failures the caller caused with the item's content.
    pub fn is_domain_rejection(&self) -> bool {
        matches!(
            self,
            Self::SegmentNotFound | Self::AlreadyMember | Self::MembershipNotFound
        )
    }
}

impl From<MembershipRepositoryError> for ChangeFailure {
    fn from(error: MembershipRepositoryError) -> Self {
        match error {
            MembershipRepositoryError::SegmentNotFound => Self::SegmentNotFound,
            MembershipRepositoryError::AlreadyMember => Self::AlreadyMember,
            MembershipRepositoryError::MembershipNotFound => Self::MembershipNotFound,
            MembershipRepositoryError::Connection { message }
            | MembershipRepositoryError::Query { message } => Self::Storage { message },
        }
    }
}

/// Outcome of one batch item, positioned by its input index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeResult {
    pub index: usize,
    pub operation: ChangeOperation,
    pub slug: SegmentSlug,
    pub outcome: Result<(), ChangeFailure>,
}

impl ChangeResult {
    /// Return `true` when the item was applied.
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
