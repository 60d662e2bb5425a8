//! # warden_policy
//!
//! Capability enforcement and policy evaluation for PipeWarden.
//!
//! This crate provides:
//! - **Capability Registry**: an explicit allow-list of action verbs per
//!   agent role, checked by the orchestrator instead of trusted from
//!   agent output. Violations are errors, never findings.
//! - **Policy Rules**: pure, stateless checks over a stage's input and
//!   output (secret patterns, injection shapes, dependency allowlists,
//!   compliance markers, style smells).
//! - **Policy Engine**: merges findings deterministically and computes a
//!   [`Decision`] with a fixed precedence: blocking severities win,
//!   low confidence escalates to a human, medium severity warns.
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_policy::{PolicyEngine, RuleContext, RuleSet, RulesConfig};
//!
//! let engine = PolicyEngine::new(RuleSet::from_config(&RulesConfig::default())?, 0.80);
//! let decision = engine.evaluate(
//!     &RuleContext::new("implement login", "fn login() { ... }"),
//!     0.95,
//! );
//! ```

pub mod capability;
pub mod engine;
pub mod error;
pub mod finding;
pub mod rules;

pub use capability::CapabilityRegistry;
pub use engine::{Decision, Outcome, PolicyEngine};
pub use error::{PolicyError, PolicyResult};
pub use finding::{PolicyFinding, Severity};
pub use rules::{
    ComplianceMarker, ComplianceMarkerRule, DependencyAllowlistRule, LintStyleRule,
    OwaspInjectionRule, PolicyRule, RuleContext, RuleSet, RulesConfig, SecretPatternRule,
};
