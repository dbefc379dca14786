//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claim populations and clinical records. Every
//! fixture is deterministic so tests can assert exact counts.

use chrono::{DateTime, Duration, TimeZone, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{AuditPeriod, ClaimId, PatientId, ProviderId};
use domain_claims::{Claim, ClinicalDocument};

use crate::builders::TestClaimBuilder;

/// Provider audited by the standard fixtures
pub const PROVIDER: &str = "PRV-RUH-0042";

/// Fixture for audit periods and clock instants
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// First half of 2024
    pub fn h1_2024() -> AuditPeriod {
        AuditPeriod {
            start: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        }
    }

    /// The instant audit runs are executed at
    pub fn run_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 9, 0, 0).unwrap()
    }

    /// 11:00 Riyadh time on the given day of the first half of 2024
    pub fn clinic_hours(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap() + Duration::days(day)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn provider() -> ProviderId {
        ProviderId::new(PROVIDER)
    }

    pub fn claim(n: usize) -> ClaimId {
        ClaimId::new(format!("CLM-{:04}", n))
    }

    pub fn patient(n: usize) -> PatientId {
        PatientId::new(format!("PAT-{:04}", n))
    }

    pub fn document_ref(n: usize) -> String {
        format!("DOC-{:04}", n)
    }
}

/// Every section any catalog code requires
pub const ALL_SECTIONS: [&str; 5] = ["history", "assessment", "plan", "operative_report", "consent"];

/// Fixture for clinical records
pub struct DocumentFixtures;

impl DocumentFixtures {
    /// A signed record carrying every section
    pub fn complete(reference: impl Into<String>) -> ClinicalDocument {
        ClinicalDocument {
            reference: reference.into(),
            sections: ALL_SECTIONS.iter().map(|s| s.to_string()).collect(),
            physician_signed: true,
            recorded_at: None,
        }
    }

    /// A record that was never signed
    pub fn unsigned(reference: impl Into<String>) -> ClinicalDocument {
        ClinicalDocument {
            physician_signed: false,
            ..Self::complete(reference)
        }
    }

    /// Complete records for every referenced claim
    pub fn for_claims(claims: &[Claim]) -> Vec<ClinicalDocument> {
        claims
            .iter()
            .filter_map(|c| c.documentation_ref.clone())
            .map(Self::complete)
            .collect()
    }
}

/// Fixture for claim populations
pub struct ClaimFixtures;

static CLEAN_POPULATION: Lazy<Vec<Claim>> = Lazy::new(|| ClaimFixtures::build_clean(200, 40));

impl ClaimFixtures {
    /// 200 claims that pass every rule; 40 of them bill above 10,000 SAR
    ///
    /// Each claim has its own patient, so no two claims share an encounter.
    /// Claims 40..200 rotate through rehabilitation, outpatient, cardiology
    /// and radiology services, giving 40 rehabilitation claims.
    pub fn clean_population() -> Vec<Claim> {
        CLEAN_POPULATION.clone()
    }

    /// A clean population of arbitrary size
    pub fn clean(total: usize, high_value: usize) -> Vec<Claim> {
        Self::build_clean(total, high_value)
    }

    /// A population in which `invalid` of `total` claims bill a code missing from the catalog
    pub fn with_unknown_codes(total: usize, invalid: usize) -> Vec<Claim> {
        Self::build_clean(total, 0)
            .into_iter()
            .enumerate()
            .map(|(i, claim)| {
                if i < invalid {
                    Claim {
                        service_code: "00000".to_string(),
                        service_category: None,
                        ..claim
                    }
                } else {
                    claim
                }
            })
            .collect()
    }

    fn build_clean(total: usize, high_value: usize) -> Vec<Claim> {
        (0..total)
            .map(|i| {
                let builder = TestClaimBuilder::new(i).with_start(TemporalFixtures::clinic_hours((i % 170) as i64));
                if i < high_value {
                    Self::high_value(builder, i)
                } else {
                    Self::routine(builder, i)
                }
                .build()
            })
            .collect()
    }

    fn high_value(builder: TestClaimBuilder, i: usize) -> TestClaimBuilder {
        if i % 2 == 0 {
            builder
                .with_code("29881", "orthopedics")
                .with_amount(dec!(10500) + Decimal::from(i as u64 * 10))
                .with_diagnoses(&["M23.205"])
        } else {
            builder
                .with_code("27447", "orthopedics")
                .with_amount(dec!(20000) + Decimal::from(i as u64 * 100))
                .with_diagnoses(&["M17.11"])
        }
    }

    fn routine(builder: TestClaimBuilder, i: usize) -> TestClaimBuilder {
        match i % 4 {
            0 => builder
                .with_code("97110", "rehabilitation")
                .with_amount(dec!(150))
                .with_diagnoses(&["M54.5"]),
            1 => builder
                .with_code("99213", "outpatient")
                .with_amount(dec!(280))
                .with_diagnoses(&["J06.9"]),
            2 => builder
                .with_code("93306", "cardiology")
                .with_amount(dec!(1200))
                .with_diagnoses(&["I10"]),
            _ => builder
                .with_code("71045", "radiology")
                .with_amount(dec!(200))
                .with_diagnoses(&["R05"]),
        }
    }
}
