//! Integration tests for the rule engine against the standard catalog

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, PatientId, ProviderId, Timezone};
use domain_claims::{Claim, ClaimIndex, ClinicalDocument, DocumentationStatus};
use domain_rules::{
    CaseResult, CodeCatalog, FindingCategory, RuleContext, RuleEngine, RuleRegistry, Severity,
    MAX_CASE_POINTS,
};

fn claim(id: &str, patient: &str, code: &str, amount: rust_decimal::Decimal) -> Claim {
    Claim {
        id: ClaimId::new(id),
        provider_id: ProviderId::new("PRV-100"),
        patient_id: PatientId::new(patient),
        amount,
        service_code: code.to_string(),
        diagnosis_codes: vec!["M17.11".to_string()],
        documentation_ref: Some(format!("DOC-{}", id)),
        service_start: Utc.with_ymd_and_hms(2024, 5, 12, 7, 30, 0).unwrap(),
        service_end: None,
        service_category: Some("orthopedics".to_string()),
    }
}

fn evaluate_all(population: &[Claim], docs: &DocumentationStatus) -> Vec<CaseResult> {
    let catalog = CodeCatalog::standard().unwrap();
    let index = ClaimIndex::new(population, Timezone::for_region("Riyadh"));
    let engine = RuleEngine::new(RuleRegistry::standard().rules_for("2.0").unwrap());
    let audited_at = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    population
        .iter()
        .map(|c| engine.evaluate(c, &RuleContext::new(&catalog, docs, &index), audited_at))
        .collect()
}

#[test]
fn test_knee_replacement_with_unbundled_arthroscopy() {
    let docs = DocumentationStatus::Attached(ClinicalDocument {
        reference: "DOC".to_string(),
        sections: ["history", "assessment", "plan", "operative_report", "consent"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        physician_signed: true,
        recorded_at: None,
    });
    let mut arthroscopy = claim("CLM-2", "PAT-1", "29881", dec!(11000));
    arthroscopy.diagnosis_codes = vec!["M23.205".to_string()];
    let population = vec![claim("CLM-1", "PAT-1", "27447", dec!(42000)), arthroscopy];

    let results = evaluate_all(&population, &docs);

    assert!(results[0].findings.is_empty());
    assert!(results[1].has_rule("SBS004-U"));
    assert!(results[1].has_category(FindingCategory::BillingSystem));
    assert_eq!(results[1].total_points, 5);
}

#[test]
fn test_worst_case_claim_is_capped() {
    let mut bad = claim("CLM-9", "PAT-2", "99215", dec!(900));
    bad.diagnosis_codes.clear();
    bad.documentation_ref = None;
    let mut twin = bad.clone();
    twin.id = ClaimId::new("CLM-10");

    let results = evaluate_all(&[bad, twin], &DocumentationStatus::NotReferenced);
    let first = &results[0];

    // necessity 5 + documentation 3 + upcoding 5 + duplicate 5 + fee 3 + timing 3
    assert_eq!(first.raw_points, 24);
    assert!(first.total_points <= MAX_CASE_POINTS);
    assert!(first.findings.iter().all(|f| f.points == f.severity.penalty_points()));
    assert!(first.findings.iter().any(|f| f.severity == Severity::High));
}

#[test]
fn test_catalog_file_round_trip_through_registry() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("catalogs/sbs_v2.json");
    let catalog = CodeCatalog::load_from_file(&path).unwrap();
    let registry = RuleRegistry::standard();

    assert_eq!(catalog.version(), "2.0");
    assert!(registry.has_version(catalog.version()));
}

proptest! {
    #[test]
    fn prop_case_points_stay_capped(
        cents in 100i64..5_000_000i64,
        code in prop_oneof![Just("99213"), Just("99215"), Just("27447"), Just("00000")],
        documented in any::<bool>(),
    ) {
        let mut c = claim("CLM-P", "PAT-P", code, rust_decimal::Decimal::new(cents, 2));
        if !documented {
            c.documentation_ref = None;
        }
        let results = evaluate_all(&[c], &DocumentationStatus::NotReferenced);

        prop_assert!(results[0].total_points <= MAX_CASE_POINTS);
        prop_assert!(results[0].total_points <= results[0].raw_points);
    }
}
