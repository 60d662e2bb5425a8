//! Error types for agent invocation.

use thiserror::Error;

use crate::roles::AgentRole;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur at the agent boundary.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The collaborator failed; `retryable` distinguishes transient
    /// faults (worth another attempt) from permanent ones.
    #[error("Agent invocation failed: {message}")]
    InvocationFailed { message: String, retryable: bool },

    #[error("Agent invocation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("No scripted report left for role '{0}'")]
    ScenarioExhausted(AgentRole),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether the orchestrator may retry the invocation.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::InvocationFailed { retryable, .. } => *retryable,
            AgentError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Shorthand for a transient collaborator fault.
    pub fn transient(message: impl Into<String>) -> Self {
        AgentError::InvocationFailed {
            message: message.into(),
            retryable: true,
        }
    }

    /// Shorthand for a permanent collaborator fault.
    pub fn fatal(message: impl Into<String>) -> Self {
        AgentError::InvocationFailed {
            message: message.into(),
            retryable: false,
        }
    }
}
