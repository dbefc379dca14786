//! Strongly-typed identifiers for domain entities
//!
//! Two families of identifiers exist:
//! - Engine-issued identifiers (audit runs, corrective plans) wrap UUIDs and
//!   are derived by name (UUID v5) so that a re-run of the same audit yields
//!   the same identifier.
//! - Externally-issued identifiers (claims, providers, patients) wrap the
//!   codes assigned by the submitting system and are ordered lexically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Namespace for name-derived engine identifiers
const ENGINE_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_93d4_4b57_a0e2_5c7d_1b3f_9e42);

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Derives a stable identifier from a name
            ///
            /// The same name always yields the same identifier.
            pub fn from_name(name: &str) -> Self {
                let scoped = format!("{}:{}", $prefix, name);
                Self(Uuid::new_v5(&ENGINE_NAMESPACE, scoped.as_bytes()))
            }

            /// Creates a new random identifier
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates from an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let uuid_str = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(uuid_str)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

macro_rules! define_code {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an externally-issued code
            pub fn new(code: impl Into<String>) -> Self {
                Self(code.into())
            }

            /// Returns the code as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the code is blank
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self(code.to_string())
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self(code)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Engine-issued identifiers
define_id!(AuditRunId, "AUD");
define_id!(CorrectivePlanId, "CAP");

// Externally-issued identifiers
define_code!(ClaimId);
define_code!(ProviderId);
define_code!(PatientId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_display() {
        let id = AuditRunId::from_name("provider-1");
        assert!(id.to_string().starts_with("AUD-"));
    }

    #[test]
    fn test_run_id_is_stable_by_name() {
        assert_eq!(AuditRunId::from_name("x"), AuditRunId::from_name("x"));
        assert_ne!(AuditRunId::from_name("x"), AuditRunId::from_name("y"));
    }

    #[test]
    fn test_plan_and_run_ids_do_not_collide() {
        let run = AuditRunId::from_name("same");
        let plan = CorrectivePlanId::from_name("same");
        assert_ne!(run.as_uuid(), plan.as_uuid());
    }

    #[test]
    fn test_id_parsing() {
        let original = AuditRunId::from_name("parse-me");
        let parsed: AuditRunId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_claim_ids_order_lexically() {
        let mut ids = vec![ClaimId::new("CLM-003"), ClaimId::new("CLM-001"), ClaimId::new("CLM-002")];
        ids.sort();
        assert_eq!(ids[0].as_str(), "CLM-001");
        assert_eq!(ids[2].as_str(), "CLM-003");
    }

    #[test]
    fn test_blank_code() {
        assert!(ProviderId::new("  ").is_blank());
        assert!(!ProviderId::new("PRV-1").is_blank());
    }
}
