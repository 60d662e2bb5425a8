//! Pipeline run and stage execution state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_agents::{ActionVerb, AgentRole};
use warden_policy::Decision;

use crate::error::{CoreError, CoreResult};

/// Deployment target environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The ordered stage kinds of a delivery pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Design,
    Dev,
    Test,
    Cyber,
    Build,
    Artifact,
    Deploy,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Design => "design",
            StageKind::Dev => "dev",
            StageKind::Test => "test",
            StageKind::Cyber => "cyber",
            StageKind::Build => "build",
            StageKind::Artifact => "artifact",
            StageKind::Deploy => "deploy",
        }
    }

    /// The declared pipeline order. A stage cannot start until its
    /// predecessor has passed.
    pub fn default_order() -> Vec<StageKind> {
        vec![
            StageKind::Design,
            StageKind::Dev,
            StageKind::Test,
            StageKind::Cyber,
            StageKind::Build,
            StageKind::Artifact,
            StageKind::Deploy,
        ]
    }

    /// The agent role that executes this stage. Delivery stages all
    /// belong to the CI/CD role.
    pub fn role(&self) -> AgentRole {
        match self {
            StageKind::Design => AgentRole::Design,
            StageKind::Dev => AgentRole::Dev,
            StageKind::Test => AgentRole::Test,
            StageKind::Cyber => AgentRole::Cyber,
            StageKind::Build | StageKind::Artifact | StageKind::Deploy => AgentRole::Cicd,
        }
    }

    /// Verbs a stage needs from its role's capability grant.
    pub fn required_verbs(&self) -> Vec<ActionVerb> {
        use ActionVerb::*;
        match self {
            StageKind::Design => vec![Read, Write],
            StageKind::Dev => vec![Read, Write, Edit, Execute],
            StageKind::Test => vec![Read, Write, Execute],
            StageKind::Cyber => vec![Read, Execute],
            StageKind::Build | StageKind::Artifact => vec![Read, Execute],
            StageKind::Deploy => vec![Read, Execute, Deploy],
        }
    }

    /// Whether this stage performs a delivery action through an external
    /// backend after its approval gate is satisfied.
    pub fn is_delivery(&self) -> bool {
        matches!(self, StageKind::Build | StageKind::Artifact | StageKind::Deploy)
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of one stage execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    AwaitingApproval,
    Blocked,
    Passed,
    Failed,
}

impl StageStatus {
    /// Monotonic transition guard. History never moves backwards; the
    /// only exits from `Blocked` are a recorded human override (to
    /// `Passed`, or back through a delivery gate); rollback appends a
    /// compensating execution instead of mutating this one.
    pub fn can_transition(self, to: StageStatus) -> bool {
        use StageStatus::*;
        matches!(
            (self, to),
            (Pending, Running)
                | (Running, AwaitingApproval)
                | (Running, Blocked)
                | (Running, Passed)
                | (Running, Failed)
                | (AwaitingApproval, Passed)
                | (AwaitingApproval, Blocked)
                | (Blocked, Passed)
                | (Blocked, AwaitingApproval)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::AwaitingApproval => "awaiting_approval",
            StageStatus::Blocked => "blocked",
            StageStatus::Passed => "passed",
            StageStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overall status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Blocked,
    Completed,
    Aborted,
    RolledBack,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Aborted | RunStatus::RolledBack
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Blocked => "blocked",
            RunStatus::Completed => "completed",
            RunStatus::Aborted => "aborted",
            RunStatus::RolledBack => "rolled_back",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One agent's turn in a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageExecution {
    pub id: Uuid,
    pub stage: StageKind,
    pub role: AgentRole,
    /// 1-based attempt number for this stage kind within the run.
    pub attempt: u32,
    pub input: String,
    pub output: String,
    pub confidence: f64,
    pub decision: Option<Decision>,
    pub status: StageStatus,
    #[serde(default)]
    pub approval_request_id: Option<String>,
    /// Populated for compensating executions (rollback) and failures.
    #[serde(default)]
    pub reason: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl StageExecution {
    pub fn new(stage: StageKind, attempt: u32, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            stage,
            role: stage.role(),
            attempt,
            input: input.into(),
            output: String::new(),
            confidence: 0.0,
            decision: None,
            status: StageStatus::Pending,
            approval_request_id: None,
            reason: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to a new status, enforcing the monotonic transition guard.
    pub fn transition(&mut self, to: StageStatus) -> CoreResult<()> {
        if !self.status.can_transition(to) {
            return Err(CoreError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        if matches!(
            to,
            StageStatus::Passed | StageStatus::Failed | StageStatus::Blocked
        ) {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }
}

/// One pipeline execution, owned exclusively by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    /// Links every audit entry of this run.
    pub correlation_id: String,
    pub task: String,
    pub environment: Environment,
    /// Planned stage kinds, executed strictly in order.
    pub plan: Vec<StageKind>,
    /// Index of the next planned stage that has not passed yet.
    pub plan_index: usize,
    /// Every stage execution, append-only (retries and compensating
    /// executions included).
    pub stages: Vec<StageExecution>,
    pub status: RunStatus,
    #[serde(default)]
    pub build_number: Option<u64>,
    #[serde(default)]
    pub artifact_version: Option<String>,
    #[serde(default)]
    pub artifact_digest: Option<String>,
    #[serde(default)]
    pub deployment_ids: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(task: impl Into<String>, environment: Environment, plan: Vec<StageKind>) -> Self {
        let id = Uuid::new_v4();
        let hex = id.simple().to_string();
        let now = Utc::now();
        Self {
            id,
            correlation_id: format!("run-{}", &hex[..8]),
            task: task.into(),
            environment,
            plan,
            plan_index: 0,
            stages: Vec::new(),
            status: RunStatus::Running,
            build_number: None,
            artifact_version: None,
            artifact_digest: None,
            deployment_ids: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The next planned stage kind, if the plan is not exhausted.
    pub fn next_stage_kind(&self) -> Option<StageKind> {
        self.plan.get(self.plan_index).copied()
    }

    /// The most recent execution, if any.
    pub fn current_stage(&self) -> Option<&StageExecution> {
        self.stages.last()
    }

    pub fn current_stage_mut(&mut self) -> Option<&mut StageExecution> {
        self.stages.last_mut()
    }

    /// Attempts already made for a stage kind.
    pub fn attempts_for(&self, kind: StageKind) -> u32 {
        self.stages.iter().filter(|s| s.stage == kind).count() as u32
    }

    /// Outputs of passed stages, in plan order, for rule context.
    pub fn passed_outputs(&self) -> Vec<String> {
        self.stages
            .iter()
            .filter(|s| s.status == StageStatus::Passed)
            .map(|s| s.output.clone())
            .collect()
    }

    /// The output feeding the next stage: the latest passed stage's
    /// output, or the task itself for the first stage.
    pub fn latest_output(&self) -> &str {
        self.stages
            .iter()
            .rev()
            .find(|s| s.status == StageStatus::Passed)
            .map(|s| s.output.as_str())
            .unwrap_or(&self.task)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
