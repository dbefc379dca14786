//! Rules Domain
//!
//! This crate validates individual claims against a versioned coding and
//! billing rule set.
//!
//! # Evaluation flow
//!
//! ```text
//! RuleRegistry::rules_for("2.0") ──> [SBS001, SBS002, ..., SBS005]
//!                                           │
//!   Claim + RuleContext ──> RuleEngine ─────┘──> CaseResult (capped at 25 points)
//! ```
//!
//! The [`CodeCatalog`] supplies the code list, fee schedule, bundling pairs
//! and tier groups the rules consult. It is loaded from JSON; a default
//! catalog ships with the crate.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod finding;
pub mod registry;
pub mod rule;
pub mod rules;

pub use catalog::{CodeCatalog, CodeEntry, CatalogMetadata, RegionalBenchmark};
pub use engine::{CaseResult, RuleEngine, MAX_CASE_POINTS, UNVERIFIABLE_CODE};
pub use error::{CatalogError, RuleError};
pub use finding::{BilingualText, Finding, FindingCategory, Severity};
pub use registry::RuleRegistry;
pub use rule::{AuditRule, RuleContext};
