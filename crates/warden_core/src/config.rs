//! Configuration surface, loaded once at process start.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use warden_agents::{ActionVerb, AgentRole};
use warden_approval::{ApprovalPolicy, PendingRequestPolicy};
use warden_policy::{CapabilityRegistry, RulesConfig};

use crate::error::{CoreError, CoreResult};
use crate::run::{Environment, StageKind};

/// Approval requirements keyed by gate kind and target environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalMatrix {
    /// Deployment gates per environment. Dev auto-approves, staging
    /// needs one identity, prod needs two distinct identities.
    #[serde(default = "default_deploy_policies")]
    pub deploy: HashMap<Environment, ApprovalPolicy>,
    /// Gate for the Build stage's backend call. Auto-approved (still
    /// logged) unless configured otherwise.
    #[serde(default = "zero_policy")]
    pub build: ApprovalPolicy,
    /// Gate for the Artifact stage's backend call.
    #[serde(default = "zero_policy")]
    pub artifact: ApprovalPolicy,
    /// Gate created for a `warn` outcome.
    #[serde(default)]
    pub review: ApprovalPolicy,
    /// Gate created for an `escalate` outcome.
    #[serde(default)]
    pub clarification: ApprovalPolicy,
}

fn default_deploy_policies() -> HashMap<Environment, ApprovalPolicy> {
    let mut map = HashMap::new();
    map.insert(Environment::Dev, ApprovalPolicy::new(0));
    map.insert(Environment::Staging, ApprovalPolicy::new(1));
    map.insert(Environment::Prod, ApprovalPolicy::new(2));
    map
}

fn zero_policy() -> ApprovalPolicy {
    ApprovalPolicy::new(0)
}

impl ApprovalMatrix {
    /// The deployment policy for an environment. An unconfigured
    /// environment fails closed to dual approval.
    pub fn deploy_policy(&self, env: Environment) -> ApprovalPolicy {
        self.deploy
            .get(&env)
            .copied()
            .unwrap_or_else(|| ApprovalPolicy::new(2))
    }

    /// The gate policy for a delivery stage's backend call.
    pub fn delivery_policy(&self, kind: StageKind, env: Environment) -> ApprovalPolicy {
        match kind {
            StageKind::Build => self.build,
            StageKind::Artifact => self.artifact,
            _ => self.deploy_policy(env),
        }
    }
}

impl Default for ApprovalMatrix {
    fn default() -> Self {
        Self {
            deploy: default_deploy_policies(),
            build: zero_policy(),
            artifact: zero_policy(),
            review: ApprovalPolicy::new(1),
            clarification: ApprovalPolicy::new(1),
        }
    }
}

/// Kill-switch behavior knobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KillSwitchConfig {
    /// What happens to approval requests already pending when the
    /// switch engages.
    #[serde(default)]
    pub pending_requests: PendingRequestPolicy,
}

/// Top-level configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Decisions with agent confidence below this escalate to a human.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// Maximum invocation attempts per stage before the run aborts.
    #[serde(default = "default_max_stage_attempts")]
    pub max_stage_attempts: u32,
    /// Character bound on the context handed to an agent.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
    /// CI job triggered by the Build stage.
    #[serde(default = "default_build_job")]
    pub build_job: String,
    /// Repository the Artifact stage uploads into.
    #[serde(default = "default_artifact_repo")]
    pub artifact_repo: String,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Retention horizon honored by export tooling; the core itself
    /// never deletes ledger lines.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Stage kinds to run, in order. Defaults to the full pipeline.
    #[serde(default = "StageKind::default_order")]
    pub plan: Vec<StageKind>,
    /// Capability grants per role. Empty means the standard grant set.
    #[serde(default)]
    pub capabilities: HashMap<AgentRole, BTreeSet<ActionVerb>>,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub approvals: ApprovalMatrix,
    #[serde(default)]
    pub kill_switch: KillSwitchConfig,
}

fn default_confidence_threshold() -> f64 {
    0.80
}
fn default_max_stage_attempts() -> u32 {
    3
}
fn default_context_limit() -> usize {
    4000
}
fn default_build_job() -> String {
    "pipeline-build".to_string()
}
fn default_artifact_repo() -> String {
    "libs-release-local".to_string()
}
fn default_ledger_path() -> PathBuf {
    PathBuf::from("./warden-state/ledger.jsonl")
}
fn default_retention_days() -> u32 {
    365
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_stage_attempts: default_max_stage_attempts(),
            context_limit: default_context_limit(),
            build_job: default_build_job(),
            artifact_repo: default_artifact_repo(),
            ledger_path: default_ledger_path(),
            retention_days: default_retention_days(),
            plan: StageKind::default_order(),
            capabilities: HashMap::new(),
            rules: RulesConfig::default(),
            approvals: ApprovalMatrix::default(),
            kill_switch: KillSwitchConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Load and validate configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(CoreError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.max_stage_attempts == 0 {
            return Err(CoreError::Config(
                "max_stage_attempts must be at least 1".to_string(),
            ));
        }
        if self.plan.is_empty() {
            return Err(CoreError::Config("plan must not be empty".to_string()));
        }
        Ok(())
    }

    /// Build the capability registry from the configured grants, or the
    /// standard set if none are configured.
    pub fn capability_registry(&self) -> CapabilityRegistry {
        if self.capabilities.is_empty() {
            CapabilityRegistry::standard()
        } else {
            CapabilityRegistry::new(self.capabilities.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_policy() {
        let config = WardenConfig::default();
        assert_eq!(config.confidence_threshold, 0.80);
        assert_eq!(config.max_stage_attempts, 3);
        assert_eq!(
            config.approvals.deploy_policy(Environment::Dev).required_approvers,
            0
        );
        assert_eq!(
            config
                .approvals
                .deploy_policy(Environment::Staging)
                .required_approvers,
            1
        );
        assert_eq!(
            config.approvals.deploy_policy(Environment::Prod).required_approvers,
            2
        );
    }

    #[test]
    fn unconfigured_environment_fails_closed() {
        let matrix = ApprovalMatrix {
            deploy: HashMap::new(),
            ..Default::default()
        };
        assert_eq!(matrix.deploy_policy(Environment::Prod).required_approvers, 2);
    }

    #[test]
    fn parses_partial_yaml_with_defaults() {
        let yaml = r#"
confidence_threshold: 0.7
approvals:
  deploy:
    prod:
      required_approvers: 3
      deadline_seconds: 7200
"#;
        let config: WardenConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.approvals.deploy_policy(Environment::Prod).required_approvers, 3);
        // Unspecified fields keep their defaults.
        assert_eq!(config.max_stage_attempts, 3);
        assert_eq!(config.plan.len(), 7);
    }

    #[test]
    fn validation_rejects_bad_threshold() {
        let config = WardenConfig {
            confidence_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn custom_capabilities_override_standard() {
        let mut capabilities = HashMap::new();
        capabilities.insert(
            AgentRole::Dev,
            [ActionVerb::Read].into_iter().collect::<BTreeSet<_>>(),
        );
        let config = WardenConfig {
            capabilities,
            ..Default::default()
        };
        let registry = config.capability_registry();
        assert!(registry.is_permitted(AgentRole::Dev, ActionVerb::Read));
        assert!(!registry.is_permitted(AgentRole::Dev, ActionVerb::Write));
    }
}
