//! The agent invocation boundary.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AgentResult;
use crate::roles::{ActionVerb, AgentRole};

/// A role-scoped task handed to the external collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInvocation {
    /// Pipeline run this invocation belongs to.
    pub correlation_id: String,
    /// The role the collaborator should act as.
    pub role: AgentRole,
    /// The task description for this stage.
    pub task: String,
    /// Verbs the collaborator is allowed to use. Anything outside this
    /// set in the returned report is a capability violation.
    pub allowed_verbs: BTreeSet<ActionVerb>,
    /// Bounded context: the predecessor stage's output (possibly
    /// truncated by the orchestrator).
    pub context: String,
}

impl AgentInvocation {
    pub fn new(
        correlation_id: impl Into<String>,
        role: AgentRole,
        task: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            role,
            task: task.into(),
            allowed_verbs: BTreeSet::new(),
            context: String::new(),
        }
    }

    pub fn with_allowed_verbs(mut self, verbs: impl IntoIterator<Item = ActionVerb>) -> Self {
        self.allowed_verbs = verbs.into_iter().collect();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// A complete result from one agent invocation.
///
/// Streaming, if the collaborator uses it, is its own transport detail;
/// the boundary only deals in finished reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReport {
    /// The agent's produced output (design doc, diff summary, scan
    /// report, ...).
    pub output: String,
    /// Self-reported confidence in `[0, 1]`.
    pub confidence: f64,
    /// Tool-call verbs the collaborator declares it performed.
    #[serde(default)]
    pub tool_calls: Vec<ActionVerb>,
}

impl AgentReport {
    pub fn new(output: impl Into<String>, confidence: f64) -> Self {
        Self {
            output: output.into(),
            confidence,
            tool_calls: Vec::new(),
        }
    }

    pub fn with_tool_calls(mut self, calls: impl IntoIterator<Item = ActionVerb>) -> Self {
        self.tool_calls = calls.into_iter().collect();
        self
    }

    /// Verbs reported by the collaborator that fall outside the allowed
    /// set. Non-empty means the report itself is a capability violation.
    pub fn disallowed_calls(&self, allowed: &BTreeSet<ActionVerb>) -> Vec<ActionVerb> {
        let mut out: Vec<ActionVerb> = self
            .tool_calls
            .iter()
            .copied()
            .filter(|v| !allowed.contains(v))
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

/// External collaborator that runs one agent turn.
///
/// Implementations may block for a configured timeout; failures must map
/// to [`crate::AgentError`] with an accurate retryable flag.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, request: &AgentInvocation) -> AgentResult<AgentReport>;
}
