//! Error types for the audit ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for audit operations.
pub type AuditResult<T> = Result<T, AuditError>;

/// Errors that can occur during audit ledger operations.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Failed to open ledger at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "Ledger integrity violation at sequence {sequence}: expected hash {expected}, found {actual}"
    )]
    IntegrityViolation {
        sequence: u64,
        expected: String,
        actual: String,
    },

    #[error("Ledger is sealed after a failed verification; refusing to append")]
    LedgerSealed,

    #[error("Export range {from}..={to} is outside the ledger (len {len})")]
    RangeOutOfBounds { from: u64, to: u64, len: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
