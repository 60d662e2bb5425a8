//! Capability registry: the per-role action allow-list.
//!
//! Loaded once at process start and read-only for the life of the
//! process. Changing grants is a configuration operation, not a runtime
//! mutation.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;
use warden_agents::{ActionVerb, AgentRole};

use crate::error::{PolicyError, PolicyResult};

/// Immutable mapping of agent roles to permitted action verbs.
#[derive(Debug, Clone)]
pub struct CapabilityRegistry {
    grants: HashMap<AgentRole, BTreeSet<ActionVerb>>,
}

impl CapabilityRegistry {
    /// Build a registry from explicit grants.
    pub fn new(grants: HashMap<AgentRole, BTreeSet<ActionVerb>>) -> Self {
        for (role, verbs) in &grants {
            debug!(role = %role, verbs = verbs.len(), "Capability grant");
        }
        Self { grants }
    }

    /// The standard grant set.
    ///
    /// The CI/CD role deliberately has no write or edit verb: separation
    /// of duties keeps the deploying agent out of application code.
    pub fn standard() -> Self {
        use ActionVerb::*;
        let mut grants: HashMap<AgentRole, BTreeSet<ActionVerb>> = HashMap::new();
        grants.insert(AgentRole::Design, [Read, Write].into_iter().collect());
        grants.insert(
            AgentRole::Dev,
            [Read, Write, Edit, Execute].into_iter().collect(),
        );
        grants.insert(
            AgentRole::Test,
            [Read, Write, Execute].into_iter().collect(),
        );
        grants.insert(AgentRole::Cyber, [Read, Execute].into_iter().collect());
        grants.insert(
            AgentRole::Cicd,
            [Read, Execute, Deploy].into_iter().collect(),
        );
        Self::new(grants)
    }

    /// Verbs the role is permitted to perform. Unknown roles get the
    /// empty set, which fails every check.
    pub fn allowed_actions(&self, role: AgentRole) -> BTreeSet<ActionVerb> {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    pub fn is_permitted(&self, role: AgentRole, verb: ActionVerb) -> bool {
        self.grants
            .get(&role)
            .map_or(false, |verbs| verbs.contains(&verb))
    }

    /// Check a set of verbs against the role's grant, failing on the
    /// first verb outside it.
    pub fn check(
        &self,
        role: AgentRole,
        verbs: impl IntoIterator<Item = ActionVerb>,
    ) -> PolicyResult<()> {
        for verb in verbs {
            if !self.is_permitted(role, verb) {
                return Err(PolicyError::CapabilityViolation { role, verb });
            }
        }
        Ok(())
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
