//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use chrono::Duration;
use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::ClaimId;
use domain_claims::Claim;
use domain_rules::{BilingualText, CaseResult, Finding, FindingCategory, Severity};

use crate::builders::TestClaimBuilder;
use crate::fixtures::TemporalFixtures;

/// Strategy for generating severities
pub fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Low),
        Just(Severity::Medium),
        Just(Severity::High),
        Just(Severity::Critical),
    ]
}

/// Strategy for generating finding categories
pub fn category_strategy() -> impl Strategy<Value = FindingCategory> {
    prop_oneof![
        Just(FindingCategory::Coding),
        Just(FindingCategory::Clinical),
        Just(FindingCategory::Documentation),
        Just(FindingCategory::BillingSystem),
        Just(FindingCategory::Timing),
    ]
}

/// Strategy for generating findings
pub fn finding_strategy() -> impl Strategy<Value = Finding> {
    (
        prop_oneof![Just("SBS001"), Just("SBS002"), Just("SBS003"), Just("SBS004-F"), Just("SBS005")],
        severity_strategy(),
        category_strategy(),
    )
        .prop_map(|(code, severity, category)| {
            Finding::new(code, severity, category, BilingualText::new("generated", "مولد"))
        })
}

/// Strategy for generating a case result carrying up to `max_findings` findings
pub fn case_result_strategy(max_findings: usize) -> impl Strategy<Value = CaseResult> {
    (0usize..10_000, prop::collection::vec(finding_strategy(), 0..=max_findings)).prop_map(
        |(n, findings)| {
            CaseResult::new(
                ClaimId::new(format!("CLM-{:05}", n)),
                findings,
                TemporalFixtures::run_date(),
            )
        },
    )
}

/// Strategy for generating sets of case results
pub fn case_results_strategy(max_cases: usize) -> impl Strategy<Value = Vec<CaseResult>> {
    prop::collection::vec(case_result_strategy(6), 1..=max_cases)
}

/// Strategy for generating billed amounts between 1 and 50,000 SAR
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (100i64..5_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating a claim inside the standard audit period
pub fn claim_strategy(n: usize) -> impl Strategy<Value = Claim> {
    (
        amount_strategy(),
        0i64..180,
        0i64..24,
        prop_oneof![
            Just(("99213", "outpatient")),
            Just(("97110", "rehabilitation")),
            Just(("93306", "cardiology")),
            Just(("29881", "orthopedics")),
            Just(("99499", "outpatient")),
        ],
        0usize..40,
    )
        .prop_map(move |(amount, day, hour, (code, category), patient)| {
            let start = TemporalFixtures::h1_2024().start + Duration::days(day) + Duration::hours(hour);
            TestClaimBuilder::new(n)
                .with_code(code, category)
                .with_amount(amount)
                .with_patient(patient)
                .with_start(start.min(TemporalFixtures::h1_2024().end - Duration::hours(1)))
                .build()
        })
}

/// Strategy for generating a population of `min..=max` claims with unique ids
pub fn population_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<Claim>> {
    (min..=max).prop_flat_map(|size| {
        (0..size)
            .map(claim_strategy)
            .collect::<Vec<_>>()
    })
}
