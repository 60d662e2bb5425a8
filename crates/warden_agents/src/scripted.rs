//! Scripted agent invoker for tests and CLI scenarios.
//!
//! A scenario maps each role to a queue of predefined reports. The
//! invoker pops the next report for the requested role, or replays a
//! scripted failure, so a full pipeline can run without a model backend.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AgentError, AgentResult};
use crate::invoker::{AgentInvocation, AgentInvoker, AgentReport};
use crate::roles::{ActionVerb, AgentRole};

/// One scripted agent turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedStep {
    pub role: AgentRole,
    #[serde(default)]
    pub output: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub tool_calls: Vec<ActionVerb>,
    /// When set, the invocation fails with this message instead of
    /// returning a report.
    #[serde(default)]
    pub fail: Option<String>,
    /// Whether a scripted failure counts as retryable.
    #[serde(default)]
    pub retryable: bool,
}

fn default_confidence() -> f64 {
    0.9
}

impl ScriptedStep {
    pub fn report(role: AgentRole, output: impl Into<String>, confidence: f64) -> Self {
        Self {
            role,
            output: output.into(),
            confidence,
            tool_calls: Vec::new(),
            fail: None,
            retryable: false,
        }
    }

    pub fn failure(role: AgentRole, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            role,
            output: String::new(),
            confidence: 0.0,
            tool_calls: Vec::new(),
            fail: Some(message.into()),
            retryable,
        }
    }

    pub fn with_tool_calls(mut self, calls: impl IntoIterator<Item = ActionVerb>) -> Self {
        self.tool_calls = calls.into_iter().collect();
        self
    }
}

/// A named sequence of scripted steps, loadable from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    pub steps: Vec<ScriptedStep>,
}

impl Scenario {
    pub fn from_yaml_str(yaml: &str) -> AgentResult<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        if scenario.steps.is_empty() {
            return Err(AgentError::InvalidScenario(
                "scenario has no steps".to_string(),
            ));
        }
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> AgentResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Plays back a [`Scenario`], one report per invocation per role.
pub struct ScriptedInvoker {
    queues: Mutex<HashMap<AgentRole, VecDeque<ScriptedStep>>>,
}

impl ScriptedInvoker {
    pub fn new(scenario: Scenario) -> Self {
        let mut queues: HashMap<AgentRole, VecDeque<ScriptedStep>> = HashMap::new();
        for step in scenario.steps {
            queues.entry(step.role).or_default().push_back(step);
        }
        Self {
            queues: Mutex::new(queues),
        }
    }

    /// Build an invoker that answers every role with the same canned
    /// output and confidence, using only the verbs it was allowed.
    pub fn echo(confidence: f64) -> EchoInvoker {
        EchoInvoker { confidence }
    }

    /// Append a step at runtime (useful in tests).
    pub fn push(&self, step: ScriptedStep) {
        self.queues
            .lock()
            .expect("scenario lock poisoned")
            .entry(step.role)
            .or_default()
            .push_back(step);
    }

    /// Steps remaining for a role.
    pub fn remaining(&self, role: AgentRole) -> usize {
        self.queues
            .lock()
            .expect("scenario lock poisoned")
            .get(&role)
            .map_or(0, |q| q.len())
    }
}

#[async_trait]
impl AgentInvoker for ScriptedInvoker {
    async fn invoke(&self, request: &AgentInvocation) -> AgentResult<AgentReport> {
        let step = self
            .queues
            .lock()
            .expect("scenario lock poisoned")
            .get_mut(&request.role)
            .and_then(|q| q.pop_front())
            .ok_or(AgentError::ScenarioExhausted(request.role))?;

        debug!(role = %request.role, "Playing scripted agent step");

        if let Some(message) = step.fail {
            return Err(AgentError::InvocationFailed {
                message,
                retryable: step.retryable,
            });
        }

        Ok(AgentReport {
            output: step.output,
            confidence: step.confidence,
            tool_calls: step.tool_calls,
        })
    }
}

/// Trivial invoker that echoes the task back; every tool call stays
/// inside the allowed set.
pub struct EchoInvoker {
    confidence: f64,
}

#[async_trait]
impl AgentInvoker for EchoInvoker {
    async fn invoke(&self, request: &AgentInvocation) -> AgentResult<AgentReport> {
        let calls: Vec<ActionVerb> = request.allowed_verbs.iter().copied().collect();
        Ok(AgentReport::new(
            format!("[{}] {}", request.role, request.task),
            self.confidence,
        )
        .with_tool_calls(calls))
    }
}
