//! Audit entry types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::hasher;

/// Actions recorded in the audit ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    RunStarted,
    StageStarted,
    AgentInvoked,
    PolicyDecision,
    ApprovalRequested,
    ApprovalRecorded,
    ApprovalResolved,
    OverrideRecorded,
    StagePassed,
    StageFailed,
    RunBlocked,
    RunAborted,
    RunCompleted,
    RunCancelled,
    BuildTriggered,
    ArtifactUploaded,
    Deployment,
    Rollback,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::RunStarted => "run_started",
            AuditAction::StageStarted => "stage_started",
            AuditAction::AgentInvoked => "agent_invoked",
            AuditAction::PolicyDecision => "policy_decision",
            AuditAction::ApprovalRequested => "approval_requested",
            AuditAction::ApprovalRecorded => "approval_recorded",
            AuditAction::ApprovalResolved => "approval_resolved",
            AuditAction::OverrideRecorded => "override_recorded",
            AuditAction::StagePassed => "stage_passed",
            AuditAction::StageFailed => "stage_failed",
            AuditAction::RunBlocked => "run_blocked",
            AuditAction::RunAborted => "run_aborted",
            AuditAction::RunCompleted => "run_completed",
            AuditAction::RunCancelled => "run_cancelled",
            AuditAction::BuildTriggered => "build_triggered",
            AuditAction::ArtifactUploaded => "artifact_uploaded",
            AuditAction::Deployment => "deployment",
            AuditAction::Rollback => "rollback",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A draft entry, before the ledger assigns its place in the chain.
///
/// The ledger fills in `sequence_number`, `previous_entry_hash`, and
/// `entry_hash` at append time; everything else is supplied by the caller.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub actor_id: String,
    pub action: AuditAction,
    pub input_digest: Option<String>,
    pub output_digest: Option<String>,
    pub decision: Option<String>,
    pub approver_ids: Vec<String>,
}

impl EntryDraft {
    /// Create a new draft stamped with the current time.
    pub fn new(
        correlation_id: impl Into<String>,
        actor_id: impl Into<String>,
        action: AuditAction,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            correlation_id: correlation_id.into(),
            actor_id: actor_id.into(),
            action,
            input_digest: None,
            output_digest: None,
            decision: None,
            approver_ids: Vec::new(),
        }
    }

    pub fn with_input_digest(mut self, digest: impl Into<String>) -> Self {
        self.input_digest = Some(digest.into());
        self
    }

    pub fn with_output_digest(mut self, digest: impl Into<String>) -> Self {
        self.output_digest = Some(digest.into());
        self
    }

    pub fn with_decision(mut self, decision: impl Into<String>) -> Self {
        self.decision = Some(decision.into());
        self
    }

    pub fn with_approvers(mut self, approver_ids: Vec<String>) -> Self {
        self.approver_ids = approver_ids;
        self
    }
}

/// An immutable, chained audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditEntry {
    /// Monotonically increasing position in the ledger, starting at 0.
    pub sequence_number: u64,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: String,
    pub actor_id: String,
    pub action: AuditAction,
    #[serde(default)]
    pub input_digest: Option<String>,
    #[serde(default)]
    pub output_digest: Option<String>,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub approver_ids: Vec<String>,
    /// Hash of the preceding entry; `None` only for the first entry.
    #[serde(default)]
    pub previous_entry_hash: Option<String>,
    /// Hash over this entry's fields concatenated with `previous_entry_hash`.
    pub entry_hash: String,
}

impl AuditEntry {
    /// Build a chained entry from a draft.
    pub fn from_draft(
        draft: EntryDraft,
        sequence_number: u64,
        previous_entry_hash: Option<String>,
    ) -> Self {
        let mut entry = Self {
            sequence_number,
            timestamp: draft.timestamp,
            correlation_id: draft.correlation_id,
            actor_id: draft.actor_id,
            action: draft.action,
            input_digest: draft.input_digest,
            output_digest: draft.output_digest,
            decision: draft.decision,
            approver_ids: draft.approver_ids,
            previous_entry_hash,
            entry_hash: String::new(),
        };
        entry.entry_hash = entry.compute_hash();
        entry
    }

    /// Recompute the expected hash for this entry from its fields.
    ///
    /// The hash is computed over a canonical field string rather than the
    /// serialized JSON line, so exported segments re-verify after being
    /// re-serialized by other tooling.
    pub fn compute_hash(&self) -> String {
        hasher::sha256_hex(&self.canonical())
    }

    /// Check that `entry_hash` matches the fields it claims to cover.
    pub fn is_consistent(&self) -> bool {
        self.entry_hash == self.compute_hash()
    }

    fn canonical(&self) -> String {
        // Nanosecond RFC 3339 matches chrono's serde round-trip exactly.
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n{}",
            self.sequence_number,
            ts,
            self.correlation_id,
            self.actor_id,
            self.action.as_str(),
            self.input_digest.as_deref().unwrap_or("-"),
            self.output_digest.as_deref().unwrap_or("-"),
            self.decision.as_deref().unwrap_or("-"),
            self.approver_ids.join(","),
            self.previous_entry_hash.as_deref().unwrap_or("-"),
        )
    }
}
