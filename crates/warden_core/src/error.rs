//! Error types for the orchestration core.

use thiserror::Error;
use warden_agents::{ActionVerb, AgentError, AgentRole};
use warden_approval::ApprovalError;
use warden_audit::AuditError;
use warden_policy::PolicyError;

use crate::run::{StageKind, StageStatus};

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during pipeline orchestration.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An agent attempted or reported an action verb outside its role's
    /// allow-list. Fatal to the stage; never retried.
    #[error("Capability violation in stage '{stage}': role '{role}' used verb '{verb}'")]
    CapabilityViolation {
        stage: StageKind,
        role: AgentRole,
        verb: ActionVerb,
    },

    #[error("Agent invocation for stage '{stage}' failed after {attempts} attempt(s): {source}")]
    AgentInvocation {
        stage: StageKind,
        attempts: u32,
        source: AgentError,
    },

    #[error("Kill switch engaged; refusing to start a new stage invocation")]
    KillSwitchEngaged,

    #[error("Invalid run state: {0}")]
    InvalidState(String),

    #[error("Stage transition {from} -> {to} is not allowed")]
    InvalidTransition { from: StageStatus, to: StageStatus },

    #[error("Backend operation failed: {0}")]
    Backend(String),

    #[error("Unknown artifact version '{0}' for rollback")]
    UnknownArtifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Approval(#[from] ApprovalError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
