//! # warden_agents
//!
//! Agent roles, the action-verb vocabulary, and the invocation boundary.
//!
//! The agents' reasoning lives outside this workspace: an [`AgentInvoker`]
//! is an external collaborator that receives a role-scoped task plus the
//! verbs it is allowed to use, and returns a complete report: output,
//! a confidence score, and the list of tool-call verbs it actually
//! performed. The orchestrator checks that list against the capability
//! registry rather than trusting the agent.
//!
//! [`ScriptedInvoker`] plays back predefined reports from a YAML scenario
//! so full pipelines can run in tests and demos without a model backend.

pub mod error;
pub mod invoker;
pub mod roles;
pub mod scripted;

pub use error::{AgentError, AgentResult};
pub use invoker::{AgentInvocation, AgentInvoker, AgentReport};
pub use roles::{ActionVerb, AgentRole};
pub use scripted::{EchoInvoker, Scenario, ScriptedInvoker, ScriptedStep};
