//! Agent role and action-verb definitions.

use serde::{Deserialize, Serialize};

/// Delivery-pipeline agent roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Design,
    Dev,
    Test,
    Cyber,
    Cicd,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Design => "design",
            AgentRole::Dev => "dev",
            AgentRole::Test => "test",
            AgentRole::Cyber => "cyber",
            AgentRole::Cicd => "cicd",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::Design => "Produces design documents before implementation",
            AgentRole::Dev => "Implements features and fixes following an approved design",
            AgentRole::Test => "Generates and maintains tests for the change",
            AgentRole::Cyber => "Scans output for security issues and classifies severity",
            AgentRole::Cicd => "Drives builds, artifact uploads, and deployments",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            AgentRole::Design,
            AgentRole::Dev,
            AgentRole::Test,
            AgentRole::Cyber,
            AgentRole::Cicd,
        ]
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action verbs an agent role may be permitted to perform.
///
/// These are the capability vocabulary: the registry grants a subset per
/// role, and an agent report lists which verbs the collaborator actually
/// used so the orchestrator can check the subset relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionVerb {
    Read,
    Write,
    Edit,
    Execute,
    Deploy,
}

impl ActionVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionVerb::Read => "read",
            ActionVerb::Write => "write",
            ActionVerb::Edit => "edit",
            ActionVerb::Execute => "execute",
            ActionVerb::Deploy => "deploy",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            ActionVerb::Read,
            ActionVerb::Write,
            ActionVerb::Edit,
            ActionVerb::Execute,
            ActionVerb::Deploy,
        ]
    }
}

impl std::fmt::Display for ActionVerb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
