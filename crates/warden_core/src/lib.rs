//! # warden_core
//!
//! Pipeline orchestration for PipeWarden.
//!
//! The orchestrator drives a [`PipelineRun`] through its planned stages
//! in strict order (Design → Dev → Test → Cyber → Build → Artifact →
//! Deploy). Each stage is one agent turn: the capability registry is
//! checked first, the external agent collaborator is invoked with a
//! bounded context, its report is verified against the allowed verbs,
//! the policy engine decides, and the decision is written to the audit
//! ledger before the orchestrator acts on it.
//!
//! Runs suspend (not the process) while approval requests are pending;
//! callers resolve requests through the [`warden_approval::ApprovalGate`]
//! and call [`Orchestrator::advance`] again.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use warden_core::{Collaborators, MemoryBackend, Orchestrator, WardenConfig, Environment};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let orchestrator = Orchestrator::new(
//!     WardenConfig::default(),
//!     Arc::new(warden_audit::AuditLedger::open("./state/ledger.jsonl")?),
//!     Arc::new(warden_approval::ApprovalGate::new()),
//!     Collaborators::with_memory_backend(invoker, backend),
//! )?;
//!
//! let mut run = orchestrator.submit("add login endpoint", Environment::Staging)?;
//! orchestrator.advance(&mut run).await?;
//! ```

pub mod backends;
pub mod config;
pub mod error;
pub mod kill_switch;
pub mod orchestrator;
pub mod run;

pub use backends::{ArtifactStore, BuildBackend, DeployBackend, DeploymentRecord, MemoryBackend};
pub use config::{ApprovalMatrix, KillSwitchConfig, WardenConfig};
pub use error::{CoreError, CoreResult};
pub use kill_switch::KillSwitch;
pub use orchestrator::{Collaborators, Orchestrator};
pub use run::{Environment, PipelineRun, RunStatus, StageExecution, StageKind, StageStatus};
