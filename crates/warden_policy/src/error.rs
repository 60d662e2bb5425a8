//! Error types for capability and policy operations.

use thiserror::Error;
use warden_agents::{ActionVerb, AgentRole};

/// Result type alias for policy operations.
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors that can occur during capability checks and policy evaluation.
#[derive(Error, Debug)]
pub enum PolicyError {
    /// An agent attempted (or reported) a verb outside its role's
    /// allow-list. This is a configuration/programming error that aborts
    /// the stage; it is never downgraded to a warning.
    #[error("Capability violation: role '{role}' is not permitted to '{verb}'")]
    CapabilityViolation { role: AgentRole, verb: ActionVerb },

    #[error("Rule '{rule_id}' failed to evaluate: {message}")]
    RuleEvaluation { rule_id: String, message: String },

    #[error("Invalid pattern in rule '{rule_id}': {source}")]
    InvalidPattern {
        rule_id: String,
        source: regex::Error,
    },

    #[error("Invalid policy configuration: {0}")]
    InvalidConfiguration(String),
}
