//! Policy findings and severity model.

use serde::{Deserialize, Serialize};

/// Severity of a policy finding. Ordering is ascending, so
/// `findings.iter().map(|f| f.severity).max()` yields the worst one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// High and critical findings force a block regardless of confidence.
    pub fn blocks(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding produced by a policy rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyFinding {
    pub severity: Severity,
    pub category: String,
    pub message: String,
    pub rule_id: String,
}

impl PolicyFinding {
    pub fn new(
        rule_id: impl Into<String>,
        severity: Severity,
        category: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category: category.into(),
            message: message.into(),
            rule_id: rule_id.into(),
        }
    }
}
