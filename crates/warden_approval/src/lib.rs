//! # warden_approval
//!
//! Human-in-the-loop approval gates for PipeWarden.
//!
//! The gate manager tracks pending approval requests, enforces
//! single/dual distinct-identity policies, expires requests past their
//! deadline, and rejects resolution attempts on closed requests. It
//! never mutates code or deployment state itself; the orchestrator
//! performs the gated action only once a request is satisfied.

pub mod error;
pub mod gate;
pub mod request;

pub use error::{ApprovalError, ApprovalResult};
pub use gate::{ApprovalGate, PendingRequestPolicy};
pub use request::{
    ApprovalKind, ApprovalPolicy, ApprovalRecord, ApprovalRequest, ApprovalStatus,
};
