//! Error types for approval gates.

use thiserror::Error;

use crate::request::ApprovalStatus;

/// Result type alias for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Errors that can occur while resolving approval requests.
#[derive(Error, Debug)]
pub enum ApprovalError {
    #[error("Approval request not found: {0}")]
    UnknownRequest(String),

    /// The request already reached a terminal status; further
    /// resolution attempts are rejected, not silently ignored.
    #[error("Approval request {id} is already {status}; resolution is closed")]
    RequestClosed { id: String, status: ApprovalStatus },
}
