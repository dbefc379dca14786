//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! provider audit test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claim populations, documents and periods
//! - `builders`: Builder patterns for claims and audit requests
//! - `assertions`: Custom assertion helpers for samples and reports
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
