//! Claims Domain
//!
//! This crate models the claims a provider submits for a period and the
//! clinical documentation behind them, together with the ports the audit
//! engine uses to fetch both.
//!
//! # Claim shape
//!
//! ```text
//! Claim ── provider, patient, amount, service code, diagnoses
//!   └── documentation reference ──> ClinicalDocument (fetched on demand)
//! ```
//!
//! Claims are immutable once fetched for an audit run. Cross-claim lookups
//! (same patient, same day) go through the read-only [`ClaimIndex`].

pub mod claim;
pub mod documentation;
pub mod index;
pub mod ports;
pub mod error;

pub use claim::{Claim, OperatingHours};
pub use documentation::{ClinicalDocument, DocumentationStatus};
pub use index::ClaimIndex;
pub use ports::{ClaimSource, DocumentationSource};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockClaimSource, MockDocumentationSource, SourceFailure};
pub use error::ClaimError;
