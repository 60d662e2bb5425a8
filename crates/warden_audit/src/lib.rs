//! # warden_audit
//!
//! Hash-chained, append-only audit ledger for PipeWarden.
//!
//! Every pipeline action, policy decision, and approval is recorded as an
//! [`AuditEntry`]. Entries are chained: each entry's hash covers its own
//! fields plus the previous entry's hash, so any retroactive edit breaks
//! the chain and is detected by [`AuditLedger::verify`].
//!
//! The ledger is the single source of truth for a run's history; the
//! orchestrator's in-memory state must always be reconstructible by
//! replaying the entries for a correlation id.
//!
//! ## Example
//!
//! ```rust,ignore
//! use warden_audit::{AuditAction, AuditLedger, EntryDraft};
//!
//! let ledger = AuditLedger::open("./state/ledger.jsonl")?;
//! ledger.append(
//!     EntryDraft::new("run-42", "orchestrator", AuditAction::RunStarted)
//!         .with_input_digest(warden_audit::digest("build the feature")),
//! )?;
//! assert!(ledger.verify().is_ok());
//! ```

pub mod entry;
pub mod error;
pub mod hasher;
pub mod ledger;

pub use entry::{AuditAction, AuditEntry, EntryDraft};
pub use error::{AuditError, AuditResult};
pub use hasher::{digest, sha256_hex};
pub use ledger::{AuditLedger, LedgerSegment};
