//! Findings produced by rule evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Penalty points a finding of this severity costs
    pub fn penalty_points(&self) -> u32 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 3,
            Severity::High => 5,
            Severity::Critical => 10,
        }
    }

    /// Returns true for high and critical findings
    pub fn is_serious(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }

    pub fn all() -> [Severity; 4] {
        [Severity::Low, Severity::Medium, Severity::High, Severity::Critical]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Area a finding belongs to
///
/// Assigned when the finding is created; corrective planning switches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCategory {
    Coding,
    Clinical,
    Documentation,
    BillingSystem,
    Timing,
    Unverifiable,
}

/// Text carried in both report languages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualText {
    pub en: String,
    pub ar: String,
}

impl BilingualText {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }
}

/// A single rule violation on a claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Code of the rule that produced the finding (e.g. "SBS004-U")
    pub rule_code: String,
    pub description: BilingualText,
    pub severity: Severity,
    pub category: FindingCategory,
    /// Penalty points, derived from severity
    pub points: u32,
}

impl Finding {
    /// Creates a finding; points follow from the severity
    pub fn new(
        rule_code: impl Into<String>,
        severity: Severity,
        category: FindingCategory,
        description: BilingualText,
    ) -> Self {
        Self {
            rule_code: rule_code.into(),
            description,
            severity,
            category,
            points: severity.penalty_points(),
        }
    }

    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }
}
