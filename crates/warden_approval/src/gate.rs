//! The approval gate manager.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ApprovalError, ApprovalResult};
use crate::request::{ApprovalKind, ApprovalPolicy, ApprovalRecord, ApprovalRequest, ApprovalStatus};

/// What happens to requests still pending when the kill switch engages.
///
/// The default keeps them pending for manual resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingRequestPolicy {
    #[default]
    RemainPending,
    AutoExpire,
    AutoReject,
}

/// Tracks approval requests and enforces resolution rules.
///
/// Safe to share between concurrent runs; all methods take `&self`.
#[derive(Default)]
pub struct ApprovalGate {
    requests: Mutex<HashMap<String, ApprovalRequest>>,
}

impl ApprovalGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a request for the given stage under the given policy.
    ///
    /// A zero-approver policy returns an already-satisfied request; the
    /// caller still records it in the audit ledger.
    pub fn request_approval(
        &self,
        stage_execution_id: Uuid,
        correlation_id: impl Into<String>,
        subject: impl Into<String>,
        kind: ApprovalKind,
        policy: ApprovalPolicy,
    ) -> ApprovalRequest {
        let request =
            ApprovalRequest::new(stage_execution_id, correlation_id, subject, kind, policy);
        info!(
            request_id = %request.id,
            kind = %request.kind,
            required = request.required_approvers,
            "Approval requested"
        );
        self.requests
            .lock()
            .insert(request.id.clone(), request.clone());
        request
    }

    /// Record one approval.
    ///
    /// Duplicate approvals by the same identity are deduplicated and do
    /// not advance the count; calling twice with the same pair leaves
    /// the request unchanged. Resolution on a terminal request fails
    /// with [`ApprovalError::RequestClosed`].
    pub fn record_approval(
        &self,
        request_id: &str,
        approver_id: impl Into<String>,
        comments: Option<String>,
    ) -> ApprovalResult<ApprovalRequest> {
        let approver_id = approver_id.into();
        let mut requests = self.requests.lock();
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| ApprovalError::UnknownRequest(request_id.to_string()))?;

        if request.is_terminal() {
            return Err(ApprovalError::RequestClosed {
                id: request.id.clone(),
                status: request.status,
            });
        }

        if request
            .received
            .iter()
            .any(|r| r.approver_id == approver_id)
        {
            debug!(request_id, approver_id, "Duplicate approval ignored");
            return Ok(request.clone());
        }

        request.received.push(ApprovalRecord {
            approver_id: approver_id.clone(),
            at: Utc::now(),
            comments,
        });
        info!(
            request_id,
            approver_id,
            received = request.received.len(),
            required = request.required_approvers,
            "Approval recorded"
        );

        if request.received.len() as u32 >= request.required_approvers {
            request.status = ApprovalStatus::Satisfied;
            info!(request_id, "Approval request satisfied");
        }

        Ok(request.clone())
    }

    /// Reject a pending request.
    pub fn reject(
        &self,
        request_id: &str,
        approver_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> ApprovalResult<ApprovalRequest> {
        let mut requests = self.requests.lock();
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| ApprovalError::UnknownRequest(request_id.to_string()))?;

        if request.is_terminal() {
            return Err(ApprovalError::RequestClosed {
                id: request.id.clone(),
                status: request.status,
            });
        }

        let reason = reason.into();
        request.status = ApprovalStatus::Rejected;
        request.rejection_reason = Some(reason.clone());
        request.received.push(ApprovalRecord {
            approver_id: approver_id.into(),
            at: Utc::now(),
            comments: Some(reason),
        });
        info!(request_id, "Approval request rejected");
        Ok(request.clone())
    }

    pub fn status(&self, request_id: &str) -> ApprovalResult<ApprovalStatus> {
        self.requests
            .lock()
            .get(request_id)
            .map(|r| r.status)
            .ok_or_else(|| ApprovalError::UnknownRequest(request_id.to_string()))
    }

    pub fn get(&self, request_id: &str) -> Option<ApprovalRequest> {
        self.requests.lock().get(request_id).cloned()
    }

    /// All requests still pending, oldest first.
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        let mut pending: Vec<ApprovalRequest> = self
            .requests
            .lock()
            .values()
            .filter(|r| r.status == ApprovalStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.created_at);
        pending
    }

    /// Expire pending requests whose deadline has passed; the
    /// orchestrator treats expiry the same as a block.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Vec<ApprovalRequest> {
        let mut requests = self.requests.lock();
        let mut expired = Vec::new();
        for request in requests.values_mut() {
            if request.status == ApprovalStatus::Pending && request.deadline < now {
                request.status = ApprovalStatus::Expired;
                info!(request_id = %request.id, "Approval request expired");
                expired.push(request.clone());
            }
        }
        expired.sort_by_key(|r| r.created_at);
        expired
    }

    /// Apply the configured kill-switch policy to pending requests.
    /// Returns the requests whose status changed.
    pub fn apply_kill_switch(&self, policy: PendingRequestPolicy) -> Vec<ApprovalRequest> {
        let target = match policy {
            PendingRequestPolicy::RemainPending => return Vec::new(),
            PendingRequestPolicy::AutoExpire => ApprovalStatus::Expired,
            PendingRequestPolicy::AutoReject => ApprovalStatus::Rejected,
        };

        let mut requests = self.requests.lock();
        let mut changed = Vec::new();
        for request in requests.values_mut() {
            if request.status == ApprovalStatus::Pending {
                request.status = target;
                if target == ApprovalStatus::Rejected {
                    request.rejection_reason = Some("kill switch engaged".to_string());
                }
                changed.push(request.clone());
            }
        }
        changed.sort_by_key(|r| r.created_at);
        changed
    }
}
