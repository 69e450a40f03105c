//! Port error to domain error mapping shared by the segment services.

use crate::domain::Error;
use crate::domain::ports::{
    AuditLogError, MembershipRepositoryError, SegmentRepositoryError, UserRepositoryError,
};

pub(crate) fn map_segment_error(error: SegmentRepositoryError) -> Error {
    match error {
        SegmentRepositoryError::SegmentExists => Error::conflict(error.to_string()),
        SegmentRepositoryError::SegmentNotFound => Error::not_found(error.to_string()),
        SegmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("segment repository unavailable: {message}"))
        }
        SegmentRepositoryError::Query { message } => {
            Error::internal(format!("segment repository error: {message}"))
        }
    }
}

pub(crate) fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::UserExists => Error::conflict(error.to_string()),
        UserRepositoryError::UserNotFound => Error::not_found(error.to_string()),
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

pub(crate) fn map_membership_error(error: MembershipRepositoryError) -> Error {
    match error {
        MembershipRepositoryError::SegmentNotFound
        | MembershipRepositoryError::MembershipNotFound => Error::not_found(error.to_string()),
        MembershipRepositoryError::AlreadyMember => Error::conflict(error.to_string()),
        MembershipRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("membership repository unavailable: {message}"))
        }
        MembershipRepositoryError::Query { message } => {
            Error::internal(format!("membership repository error: {message}"))
        }
    }
}

pub(crate) fn map_audit_error(error: AuditLogError) -> Error {
    match error {
        AuditLogError::Connection { message } => {
            Error::service_unavailable(format!("audit log unavailable: {message}"))
        }
        AuditLogError::Query { message } => Error::internal(format!("audit log error: {message}")),
    }
}
