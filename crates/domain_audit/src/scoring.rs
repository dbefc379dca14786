//! Compliance scoring
//!
//! ```text
//! raw   = 100 - (points / (audited_cases * 25)) * 100, clamped to [0, 100]
//! score = raw > 90        -> min(100, raw * 1.05)
//!         70 < raw <= 90  -> raw
//!         raw <= 70       -> raw * 0.9
//! ```

use domain_rules::{CaseResult, MAX_CASE_POINTS};

/// Converts case penalties into a 0-100 compliance score
#[derive(Debug, Default, Clone, Copy)]
pub struct ComplianceScorer;

impl ComplianceScorer {
    /// Scores a set of audited cases
    ///
    /// Returns None when there is nothing to score; an empty audit never
    /// yields a score.
    pub fn score(&self, results: &[CaseResult]) -> Option<f64> {
        if results.is_empty() {
            return None;
        }
        let points: u64 = results.iter().map(|r| u64::from(r.total_points)).sum();
        Some(self.adjust(self.raw(points, results.len())))
    }

    /// Linear score before the adjustment curve, clamped to [0, 100]
    pub fn raw(&self, points: u64, audited_cases: usize) -> f64 {
        let ceiling = audited_cases as f64 * f64::from(MAX_CASE_POINTS);
        let raw = 100.0 - (points as f64 / ceiling) * 100.0;
        raw.clamp(0.0, 100.0)
    }

    /// Applies the adjustment curve to a clamped raw score
    pub fn adjust(&self, raw: f64) -> f64 {
        let raw = raw.clamp(0.0, 100.0);
        let adjusted = if raw > 90.0 {
            (raw * 1.05).min(100.0)
        } else if raw > 70.0 {
            raw
        } else {
            raw * 0.9
        };
        adjusted.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::ClaimId;
    use domain_rules::{BilingualText, Finding, FindingCategory, Severity};
    use proptest::prelude::*;

    fn case(id: &str, severities: &[Severity]) -> CaseResult {
        let findings = severities
            .iter()
            .map(|s| Finding::new("T", *s, FindingCategory::Coding, BilingualText::new("t", "t")))
            .collect();
        CaseResult::new(
            ClaimId::new(id),
            findings,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_perfect_sample_scores_100() {
        let results: Vec<_> = (0..100).map(|i| case(&format!("C{}", i), &[])).collect();
        assert_eq!(ComplianceScorer.score(&results), Some(100.0));
    }

    #[test]
    fn test_empty_sample_has_no_score() {
        assert_eq!(ComplianceScorer.score(&[]), None);
    }

    #[test]
    fn test_adjustment_bands() {
        let scorer = ComplianceScorer;
        assert!((scorer.adjust(95.0) - 99.75).abs() < 1e-9);
        assert_eq!(scorer.adjust(98.0), 100.0);
        assert_eq!(scorer.adjust(90.0), 90.0);
        assert_eq!(scorer.adjust(80.0), 80.0);
        assert!((scorer.adjust(70.0) - 63.0).abs() < 1e-9);
        assert_eq!(scorer.adjust(0.0), 0.0);
    }

    #[test]
    fn test_worst_case_scores_zero() {
        let all_bad: Vec<_> = (0..4)
            .map(|i| case(&format!("C{}", i), &[Severity::Critical; 3]))
            .collect();
        assert_eq!(ComplianceScorer.score(&all_bad), Some(0.0));
    }

    #[test]
    fn test_mid_band_is_linear() {
        // 4 cases, 20 points of 100 -> raw 80
        let results = vec![
            case("C1", &[Severity::Critical, Severity::Critical]),
            case("C2", &[]),
            case("C3", &[]),
            case("C4", &[]),
        ];
        assert_eq!(ComplianceScorer.score(&results), Some(80.0));
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(points in 0u64..10_000, cases in 1usize..400) {
            let scorer = ComplianceScorer;
            let score = scorer.adjust(scorer.raw(points, cases));
            prop_assert!((0.0..=100.0).contains(&score));
        }

        #[test]
        fn prop_more_points_never_raise_the_score(points in 0u64..2_500, extra in 1u64..50, cases in 1usize..100) {
            let scorer = ComplianceScorer;
            let before = scorer.adjust(scorer.raw(points, cases));
            let after = scorer.adjust(scorer.raw(points + extra, cases));
            prop_assert!(after <= before);
        }
    }
}
