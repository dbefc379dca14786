//! Clinical documentation behind a claim

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A clinical record fetched from the documentation store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalDocument {
    /// Reference the claim points at
    pub reference: String,
    /// Section names present in the record (e.g. "history", "assessment")
    #[serde(default)]
    pub sections: Vec<String>,
    /// Whether the treating physician signed the record
    #[serde(default)]
    pub physician_signed: bool,
    /// When the record was written
    #[serde(default)]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl ClinicalDocument {
    /// Returns true if the named section is present (case-insensitive)
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.iter().any(|s| s.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// Required sections that are absent from the record
    pub fn missing_sections<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|r| !self.has_section(r))
            .map(|r| r.as_str())
            .collect()
    }
}

/// What the engine knows about a claim's documentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentationStatus {
    /// The record was fetched
    Attached(ClinicalDocument),
    /// The claim carries no documentation reference
    NotReferenced,
    /// The reference does not resolve to a record
    Missing { reference: String },
}

impl DocumentationStatus {
    /// Returns the fetched document, if any
    pub fn document(&self) -> Option<&ClinicalDocument> {
        match self {
            DocumentationStatus::Attached(doc) => Some(doc),
            _ => None,
        }
    }
}
