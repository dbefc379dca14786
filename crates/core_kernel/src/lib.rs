//! Core Kernel - Foundational types for the provider audit engine
//!
//! This crate provides the building blocks used across all domain modules:
//! - Strongly-typed identifiers for claims, providers, patients and audit runs
//! - Temporal types for audit periods, region time zones and injectable clocks
//! - Port abstractions (errors, retry policy) for external collaborators

pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use temporal::{AuditPeriod, Clock, FixedClock, SystemClock, Timezone, TemporalError};
pub use identifiers::{
    AuditRunId, CorrectivePlanId, ClaimId, ProviderId, PatientId,
};
pub use ports::{PortError, DomainPort, RetryPolicy, OperationMetadata};
