//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for samples, runs and reports
//! that give more meaningful error messages than standard assertions.

use std::collections::HashSet;

use domain_audit::{AuditOutcome, AuditReport, AuditRun, AuditSample};

/// Asserts that a score lies in [0, 100]
pub fn assert_score_in_bounds(score: f64) {
    assert!(
        (0.0..=100.0).contains(&score),
        "Compliance score {} outside [0, 100]",
        score
    );
}

/// Asserts that two scores are equal within a tolerance
pub fn assert_score_approx_eq(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "Scores differ by more than tolerance: actual={}, expected={}, tolerance={}",
        actual,
        expected,
        tolerance
    );
}

/// Asserts that a sample holds no claim twice
pub fn assert_no_duplicate_claims(sample: &AuditSample) {
    let mut seen = HashSet::new();
    for id in sample.claim_ids() {
        assert!(seen.insert(id), "Claim {} sampled more than once", id);
    }
}

/// Asserts the sample size invariant against the population size
pub fn assert_sample_size(sample: &AuditSample, population: usize) {
    let expected = (sample.requested as usize).min(population);
    assert_eq!(
        sample.len(),
        expected,
        "Sample holds {} claims; expected min(requested {}, population {})",
        sample.len(),
        sample.requested,
        population
    );
    assert_no_duplicate_claims(sample);
}

/// Asserts that the outcome is the one the score implies, unless escalated
pub fn assert_outcome_consistent(run: &AuditRun) {
    if run.outcome == AuditOutcome::Critical {
        return;
    }
    assert_eq!(
        run.outcome,
        AuditOutcome::from_score(run.compliance_score),
        "Outcome {} does not match score {}",
        run.outcome,
        run.compliance_score
    );
}

/// Asserts that case results are ordered by claim id
pub fn assert_results_ordered(run: &AuditRun) {
    let ids: Vec<_> = run.case_results.iter().map(|r| &r.claim_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "Case results are not ordered by claim id");
}

/// Asserts that a report carries text in both languages
pub fn assert_report_bilingual(report: &AuditReport) {
    assert!(!report.summary_en.trim().is_empty(), "English summary is empty");
    assert!(!report.summary_ar.trim().is_empty(), "Arabic summary is empty");
    for step in &report.next_steps {
        assert!(!step.en.is_empty() && !step.ar.is_empty(), "Next step missing a translation: {:?}", step);
    }
}
