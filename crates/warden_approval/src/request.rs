//! Approval request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Satisfied,
    Expired,
    Rejected,
}

impl ApprovalStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Satisfied => "satisfied",
            ApprovalStatus::Expired => "expired",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a request exists: review of a warned stage, clarification of an
/// escalated one, a deployment gate, or a rollback gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    Review,
    Clarification,
    Deployment,
    Rollback,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalKind::Review => "review",
            ApprovalKind::Clarification => "clarification",
            ApprovalKind::Deployment => "deployment",
            ApprovalKind::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Configured approval requirements for a gate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    /// Number of distinct approver identities required. Zero means
    /// auto-approved (still logged).
    pub required_approvers: u32,
    /// Seconds until an unresolved request expires.
    #[serde(default = "default_deadline_seconds")]
    pub deadline_seconds: u64,
}

fn default_deadline_seconds() -> u64 {
    24 * 60 * 60
}

impl ApprovalPolicy {
    pub fn new(required_approvers: u32) -> Self {
        Self {
            required_approvers,
            deadline_seconds: default_deadline_seconds(),
        }
    }

    pub fn with_deadline_seconds(mut self, seconds: u64) -> Self {
        self.deadline_seconds = seconds;
        self
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One recorded approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub approver_id: String,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub comments: Option<String>,
}

/// A request for human approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub stage_execution_id: Uuid,
    pub correlation_id: String,
    /// Human-readable description of what is being approved.
    pub subject: String,
    pub kind: ApprovalKind,
    pub required_approvers: u32,
    /// Ordered, deduplicated by approver identity.
    pub received: Vec<ApprovalRecord>,
    pub status: ApprovalStatus,
    pub deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Set when the request is rejected.
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl ApprovalRequest {
    pub fn new(
        stage_execution_id: Uuid,
        correlation_id: impl Into<String>,
        subject: impl Into<String>,
        kind: ApprovalKind,
        policy: ApprovalPolicy,
    ) -> Self {
        let created_at = Utc::now();
        let status = if policy.required_approvers == 0 {
            ApprovalStatus::Satisfied
        } else {
            ApprovalStatus::Pending
        };
        Self {
            id: format!("approval-{}", Uuid::new_v4().simple()),
            stage_execution_id,
            correlation_id: correlation_id.into(),
            subject: subject.into(),
            kind,
            required_approvers: policy.required_approvers,
            received: Vec::new(),
            status,
            deadline: created_at + chrono::Duration::seconds(policy.deadline_seconds as i64),
            created_at,
            rejection_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Identities that have approved so far.
    pub fn approver_ids(&self) -> Vec<String> {
        self.received.iter().map(|r| r.approver_id.clone()).collect()
    }

    pub fn approvals_remaining(&self) -> u32 {
        self.required_approvers
            .saturating_sub(self.received.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_approver_policy_auto_satisfies() {
        let request = ApprovalRequest::new(
            Uuid::new_v4(),
            "run-1",
            "deploy to dev",
            ApprovalKind::Deployment,
            ApprovalPolicy::new(0),
        );
        assert_eq!(request.status, ApprovalStatus::Satisfied);
        assert!(request.is_terminal());
    }

    #[test]
    fn pending_request_tracks_remaining_approvals() {
        let request = ApprovalRequest::new(
            Uuid::new_v4(),
            "run-1",
            "deploy to prod",
            ApprovalKind::Deployment,
            ApprovalPolicy::new(2),
        );
        assert_eq!(request.status, ApprovalStatus::Pending);
        assert_eq!(request.approvals_remaining(), 2);
    }
}
