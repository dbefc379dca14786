//! Code Catalog
//!
//! The catalog is the reference data every coding and billing rule consults:
//! which service codes exist and are listed, their fee ceilings and daily
//! limits, which diagnoses justify them, which codes bundle others, and how
//! tiered code families are ranked.
//!
//! Catalogs are JSON documents so that coding teams can publish a new
//! version without code changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_rules::catalog::CodeCatalog;
//!
//! let catalog = CodeCatalog::load_from_file(Path::new("catalogs/sbs_v2.json"))?;
//! assert!(catalog.is_listed("99213"));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

const STANDARD_CATALOG_JSON: &str = include_str!("../catalogs/sbs_v2.json");

static STANDARD_CATALOG: Lazy<Result<Arc<CodeCatalog>, String>> = Lazy::new(|| {
    CodeCatalog::load_from_str(STANDARD_CATALOG_JSON)
        .map(Arc::new)
        .map_err(|e| e.to_string())
});

fn default_listed() -> bool {
    true
}

fn default_low_value_threshold() -> Decimal {
    dec!(300)
}

/// Catalog metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogMetadata {
    /// Display name
    pub name: String,
    /// Catalog version
    pub version: String,
    /// Date the catalog takes effect
    pub effective_date: String,
    /// Currency of fee amounts
    pub currency: String,
    /// Line amount at or below which a line counts as low value
    #[serde(default = "default_low_value_threshold")]
    pub low_value_threshold: Decimal,
    /// Sections every clinical record must contain unless a code overrides them
    #[serde(default)]
    pub default_required_sections: Vec<String>,
}

/// A single service code
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub description: String,
    /// Service category (e.g. "rehabilitation")
    pub category: String,
    /// Unlisted codes exist but may not be billed without review
    #[serde(default = "default_listed")]
    pub listed: bool,
    /// Fee schedule maximum
    #[serde(default)]
    pub max_fee: Option<Decimal>,
    /// Maximum units per patient per day
    #[serde(default)]
    pub max_per_day: Option<u32>,
    /// Diagnosis code prefixes that establish medical necessity
    #[serde(default)]
    pub allowed_diagnosis_prefixes: Vec<String>,
    /// Code family (e.g. "EM" for evaluation and management levels)
    #[serde(default)]
    pub group: Option<String>,
    /// Level within a tiered family; higher is more complex
    #[serde(default)]
    pub tier: Option<u32>,
    /// Diagnoses the tier requires
    #[serde(default)]
    pub min_diagnoses: Option<u32>,
    /// Clinical record sections this code requires
    #[serde(default)]
    pub required_sections: Vec<String>,
}

impl CodeEntry {
    /// Returns true if any diagnosis matches an allowed prefix
    ///
    /// Codes without prefixes accept any diagnosis.
    pub fn supports_diagnoses(&self, diagnoses: &[String]) -> bool {
        if self.allowed_diagnosis_prefixes.is_empty() {
            return !diagnoses.is_empty();
        }
        diagnoses.iter().any(|d| {
            let d = d.trim().to_ascii_uppercase();
            self.allowed_diagnosis_prefixes
                .iter()
                .any(|p| d.starts_with(&p.to_ascii_uppercase()))
        })
    }
}

/// A comprehensive code and the components it already pays for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub comprehensive: String,
    pub components: Vec<String>,
}

/// Mean claim amount of providers in a region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionalBenchmark {
    pub region: String,
    pub mean_claim_amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    codes: Vec<CodeEntry>,
    #[serde(default)]
    bundles: Vec<Bundle>,
    #[serde(default)]
    regional_benchmarks: Vec<RegionalBenchmark>,
}

/// Loaded code catalog ready for rule evaluation
#[derive(Debug, Clone)]
pub struct CodeCatalog {
    /// Catalog metadata
    pub metadata: CatalogMetadata,
    codes: HashMap<String, CodeEntry>,
    bundles: Vec<Bundle>,
    /// Highest tier per code group
    top_tiers: HashMap<String, u32>,
    benchmarks: HashMap<String, Decimal>,
}

impl CodeCatalog {
    /// Builds a catalog from a parsed JSON document
    pub fn from_json(doc: Value) -> Result<Self, CatalogError> {
        let metadata = doc
            .get("metadata")
            .ok_or_else(|| CatalogError::MissingField("metadata".to_string()))?;
        let metadata: CatalogMetadata = serde_json::from_value(metadata.clone())
            .map_err(|e| CatalogError::Parse(format!("Invalid metadata: {}", e)))?;

        if doc.get("codes").and_then(|c| c.as_array()).is_none() {
            return Err(CatalogError::MissingField("codes".to_string()));
        }
        let body: CatalogDocument =
            serde_json::from_value(doc).map_err(|e| CatalogError::Parse(e.to_string()))?;

        let mut top_tiers: HashMap<String, u32> = HashMap::new();
        for entry in &body.codes {
            if let (Some(group), Some(tier)) = (&entry.group, entry.tier) {
                let top = top_tiers.entry(group.clone()).or_insert(tier);
                *top = (*top).max(tier);
            }
        }

        let codes = body
            .codes
            .into_iter()
            .map(|e| (e.code.clone(), e))
            .collect();

        let benchmarks = body
            .regional_benchmarks
            .into_iter()
            .map(|b| (b.region.trim().to_ascii_lowercase(), b.mean_claim_amount))
            .collect();

        Ok(Self {
            metadata,
            codes,
            bundles: body.bundles,
            top_tiers,
            benchmarks,
        })
    }

    /// Loads a catalog from a JSON string
    pub fn load_from_str(json_str: &str) -> Result<Self, CatalogError> {
        let doc: Value =
            serde_json::from_str(json_str).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::from_json(doc)
    }

    /// Loads a catalog from a file path
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| CatalogError::FileNotFound(path.display().to_string()))?;
        Self::load_from_str(&content)
    }

    /// The catalog shipped with the engine
    pub fn standard() -> Result<Arc<CodeCatalog>, CatalogError> {
        STANDARD_CATALOG
            .as_ref()
            .map(Arc::clone)
            .map_err(|e| CatalogError::Parse(e.clone()))
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    pub fn entry(&self, code: &str) -> Option<&CodeEntry> {
        self.codes.get(code.trim())
    }

    pub fn is_known(&self, code: &str) -> bool {
        self.entry(code).is_some()
    }

    /// Returns true if the code exists and may be billed
    pub fn is_listed(&self, code: &str) -> bool {
        self.entry(code).map(|e| e.listed).unwrap_or(false)
    }

    pub fn category_of(&self, code: &str) -> Option<&str> {
        self.entry(code).map(|e| e.category.as_str())
    }

    pub fn group_of(&self, code: &str) -> Option<&str> {
        self.entry(code).and_then(|e| e.group.as_deref())
    }

    /// Comprehensive codes that already include the given component
    pub fn comprehensive_codes_for<'a>(&'a self, component: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.bundles
            .iter()
            .filter(move |b| b.components.iter().any(|c| c == component.trim()))
            .map(|b| b.comprehensive.as_str())
    }

    /// Returns true if the code belongs to a tiered family
    pub fn is_tiered(&self, code: &str) -> bool {
        self.entry(code)
            .map(|e| e.group.is_some() && e.tier.is_some())
            .unwrap_or(false)
    }

    /// Returns true if the code is the highest tier of its family
    pub fn is_top_tier(&self, code: &str) -> bool {
        match self.entry(code) {
            Some(CodeEntry {
                group: Some(group),
                tier: Some(tier),
                ..
            }) => self.top_tiers.get(group) == Some(tier),
            _ => false,
        }
    }

    /// Record sections the code requires
    pub fn required_sections(&self, code: &str) -> &[String] {
        match self.entry(code) {
            Some(entry) if !entry.required_sections.is_empty() => &entry.required_sections,
            _ => &self.metadata.default_required_sections,
        }
    }

    pub fn low_value_threshold(&self) -> Decimal {
        self.metadata.low_value_threshold
    }

    /// Mean claim amount benchmark for a region (case-insensitive)
    pub fn benchmark_for(&self, region: &str) -> Option<Decimal> {
        self.benchmarks.get(&region.trim().to_ascii_lowercase()).copied()
    }

    /// Number of codes in the catalog
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
