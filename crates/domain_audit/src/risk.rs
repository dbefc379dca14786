//! Provider Risk Profiling
//!
//! Five factors, each normalized to [0, 100], combine into a weighted
//! overall risk score:
//!
//! | Factor                | Weight | Input                                   |
//! |-----------------------|--------|-----------------------------------------|
//! | historical compliance | 0.30   | scores of the three most recent runs    |
//! | pattern anomaly       | 0.20   | after-hours and same-day repeat claims  |
//! | unlisted-code ratio   | 0.20   | claims with unknown or unlisted codes   |
//! | revenue growth        | 0.15   | billed total against the previous run   |
//! | peer deviation        | 0.15   | mean claim against the regional mean    |
//!
//! Profiling is advisory. A factor whose input is missing takes the neutral
//! value 50 instead of failing the run.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::ProviderId;

use crate::population::{to_f64, PopulationView};
use crate::run::AuditRunSummary;

/// Value a factor takes when its input is unavailable
pub const NEUTRAL_FACTOR: f64 = 50.0;

/// Factors above this value are high-risk areas
pub const HIGH_RISK_AREA_THRESHOLD: f64 = 70.0;

/// Number of past runs the historical factor averages
const HISTORY_WINDOW: usize = 3;

/// A named component of provider risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    HistoricalCompliance,
    PatternAnomaly,
    UnlistedCodeRatio,
    RevenueGrowth,
    PeerDeviation,
}

impl RiskFactor {
    pub fn weight(&self) -> f64 {
        match self {
            RiskFactor::HistoricalCompliance => 0.30,
            RiskFactor::PatternAnomaly => 0.20,
            RiskFactor::UnlistedCodeRatio => 0.20,
            RiskFactor::RevenueGrowth => 0.15,
            RiskFactor::PeerDeviation => 0.15,
        }
    }

    pub fn all() -> [RiskFactor; 5] {
        [
            RiskFactor::HistoricalCompliance,
            RiskFactor::PatternAnomaly,
            RiskFactor::UnlistedCodeRatio,
            RiskFactor::RevenueGrowth,
            RiskFactor::PeerDeviation,
        ]
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskFactor::HistoricalCompliance => "historical_compliance",
            RiskFactor::PatternAnomaly => "pattern_anomaly",
            RiskFactor::UnlistedCodeRatio => "unlisted_code_ratio",
            RiskFactor::RevenueGrowth => "revenue_growth",
            RiskFactor::PeerDeviation => "peer_deviation",
        };
        f.write_str(name)
    }
}

/// Provider risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            RiskLevel::Critical
        } else if score >= 60.0 {
            RiskLevel::High
        } else if score >= 30.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

/// Risk profile of a provider at the start of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    pub provider_id: ProviderId,
    pub factors: BTreeMap<RiskFactor, f64>,
    pub overall_risk: f64,
    pub risk_level: RiskLevel,
    /// Factors above [`HIGH_RISK_AREA_THRESHOLD`], in factor order
    pub high_risk_areas: Vec<RiskFactor>,
    /// Service codes flagged by recent audits
    pub flagged_codes: BTreeSet<String>,
}

impl RiskProfile {
    pub fn factor(&self, factor: RiskFactor) -> f64 {
        self.factors.get(&factor).copied().unwrap_or(NEUTRAL_FACTOR)
    }

    fn from_factors(
        provider_id: ProviderId,
        factors: BTreeMap<RiskFactor, f64>,
        flagged_codes: BTreeSet<String>,
    ) -> Self {
        let overall_risk = factors
            .iter()
            .map(|(factor, value)| factor.weight() * value)
            .sum::<f64>()
            .clamp(0.0, 100.0);
        let high_risk_areas = factors
            .iter()
            .filter(|(_, value)| **value > HIGH_RISK_AREA_THRESHOLD)
            .map(|(factor, _)| *factor)
            .collect();
        Self {
            provider_id,
            factors,
            overall_risk,
            risk_level: RiskLevel::from_score(overall_risk),
            high_risk_areas,
            flagged_codes,
        }
    }
}

/// Computes provider risk profiles
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskProfiler;

impl RiskProfiler {
    /// Profiles a provider
    ///
    /// # Arguments
    ///
    /// * `provider_id` - The audited provider
    /// * `history` - Past runs, or None when the history store was unreadable
    /// * `population` - The provider's claims for the period
    /// * `region` - Region used for the peer benchmark
    pub fn profile(
        &self,
        provider_id: &ProviderId,
        history: Option<&[AuditRunSummary]>,
        population: &PopulationView<'_>,
        region: &str,
    ) -> RiskProfile {
        let recent = recent_runs(history.unwrap_or_default());

        let mut factors = BTreeMap::new();
        factors.insert(
            RiskFactor::HistoricalCompliance,
            or_neutral(provider_id, RiskFactor::HistoricalCompliance, historical_compliance(&recent)),
        );
        factors.insert(
            RiskFactor::PatternAnomaly,
            or_neutral(provider_id, RiskFactor::PatternAnomaly, pattern_anomaly(population)),
        );
        factors.insert(
            RiskFactor::UnlistedCodeRatio,
            or_neutral(provider_id, RiskFactor::UnlistedCodeRatio, unlisted_ratio(population)),
        );
        factors.insert(
            RiskFactor::RevenueGrowth,
            or_neutral(provider_id, RiskFactor::RevenueGrowth, revenue_growth(&recent, population)),
        );
        factors.insert(
            RiskFactor::PeerDeviation,
            or_neutral(provider_id, RiskFactor::PeerDeviation, peer_deviation(population, region)),
        );

        let flagged_codes = recent
            .iter()
            .flat_map(|run| run.flagged_codes.iter().cloned())
            .collect();

        let profile = RiskProfile::from_factors(provider_id.clone(), factors, flagged_codes);
        debug!(
            provider_id = %provider_id,
            overall_risk = profile.overall_risk,
            risk_level = %profile.risk_level,
            high_risk_areas = profile.high_risk_areas.len(),
            "Risk profile computed"
        );
        profile
    }
}

fn or_neutral(provider_id: &ProviderId, factor: RiskFactor, value: Option<f64>) -> f64 {
    match value {
        Some(v) => v.clamp(0.0, 100.0),
        None => {
            warn!(provider_id = %provider_id, factor = %factor, "Risk factor input unavailable, using neutral value");
            NEUTRAL_FACTOR
        }
    }
}

/// Most recent runs first
fn recent_runs(history: &[AuditRunSummary]) -> Vec<&AuditRunSummary> {
    let mut runs: Vec<&AuditRunSummary> = history.iter().collect();
    runs.sort_by(|a, b| b.generated_at.cmp(&a.generated_at).then(a.run_id.cmp(&b.run_id)));
    runs.truncate(HISTORY_WINDOW);
    runs
}

fn historical_compliance(recent: &[&AuditRunSummary]) -> Option<f64> {
    if recent.is_empty() {
        return None;
    }
    let mean = recent.iter().map(|r| r.compliance_score).sum::<f64>() / recent.len() as f64;
    Some(100.0 - mean)
}

fn pattern_anomaly(population: &PopulationView<'_>) -> Option<f64> {
    population
        .share_where(|c| population.is_after_hours(c) || population.is_same_day_repeat(c))
        .map(|share| (share * 400.0).min(100.0))
}

fn unlisted_ratio(population: &PopulationView<'_>) -> Option<f64> {
    population
        .share_where(|c| population.is_unlisted(c))
        .map(|share| (share * 500.0).min(100.0))
}

fn revenue_growth(recent: &[&AuditRunSummary], population: &PopulationView<'_>) -> Option<f64> {
    if population.is_empty() {
        return None;
    }
    let previous = recent.first()?.population.total_billed;
    if previous <= Decimal::ZERO {
        return None;
    }
    let growth = to_f64((population.total_billed() - previous) / previous);
    Some((growth * 200.0).clamp(0.0, 100.0))
}

fn peer_deviation(population: &PopulationView<'_>, region: &str) -> Option<f64> {
    let benchmark = population.catalog.benchmark_for(region)?;
    if benchmark <= Decimal::ZERO {
        return None;
    }
    let mean = population.mean_amount()?;
    let deviation = to_f64(((mean - benchmark) / benchmark).abs());
    Some((deviation * 100.0).min(100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::AuditOutcome;
    use crate::population::PopulationSummary;
    use chrono::{TimeZone, Utc};
    use core_kernel::{AuditPeriod, AuditRunId, ClaimId, PatientId, Timezone};
    use domain_claims::{Claim, ClaimIndex, OperatingHours};
    use domain_rules::CodeCatalog;
    use rust_decimal_macros::dec;

    fn claim(id: &str, code: &str, amount: Decimal, hour: u32) -> Claim {
        Claim {
            id: ClaimId::new(id),
            provider_id: ProviderId::new("PRV-1"),
            patient_id: PatientId::new(id),
            amount,
            service_code: code.to_string(),
            diagnosis_codes: vec![],
            documentation_ref: None,
            service_start: Utc.with_ymd_and_hms(2024, 2, 2, hour, 0, 0).unwrap(),
            service_end: None,
            service_category: None,
        }
    }

    fn past_run(day: u32, score: f64, billed: Decimal) -> AuditRunSummary {
        AuditRunSummary {
            run_id: AuditRunId::from_name(&format!("past-{}", day)),
            provider_id: ProviderId::new("PRV-1"),
            period: AuditPeriod::new(
                Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap(),
            )
            .unwrap(),
            generated_at: Utc.with_ymd_and_hms(2023, 8, day, 0, 0, 0).unwrap(),
            compliance_score: score,
            outcome: AuditOutcome::from_score(score),
            population: PopulationSummary {
                claim_count: 10,
                total_billed: billed,
            },
            flagged_codes: vec!["99215".to_string()],
        }
    }

    #[test]
    fn test_no_history_is_neutral() {
        let claims = vec![claim("C1", "99213", dec!(1500), 10)];
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(&claims, Timezone::default());
        let view = PopulationView::new(&claims, &index, &catalog, OperatingHours::default());

        let profile = RiskProfiler.profile(&ProviderId::new("PRV-1"), None, &view, "riyadh");
        assert_eq!(profile.factor(RiskFactor::HistoricalCompliance), NEUTRAL_FACTOR);
        assert_eq!(profile.factor(RiskFactor::RevenueGrowth), NEUTRAL_FACTOR);
        assert_eq!(profile.factor(RiskFactor::PeerDeviation), 0.0);
        assert!(profile.flagged_codes.is_empty());
    }

    #[test]
    fn test_historical_factor_uses_three_most_recent_runs() {
        let claims = vec![claim("C1", "99213", dec!(1500), 10)];
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(&claims, Timezone::default());
        let view = PopulationView::new(&claims, &index, &catalog, OperatingHours::default());
        let history = vec![
            past_run(1, 10.0, dec!(1000)),
            past_run(2, 60.0, dec!(1000)),
            past_run(3, 70.0, dec!(1000)),
            past_run(4, 80.0, dec!(1000)),
        ];

        let profile = RiskProfiler.profile(&ProviderId::new("PRV-1"), Some(history.as_slice()), &view, "riyadh");
        assert!((profile.factor(RiskFactor::HistoricalCompliance) - 30.0).abs() < 1e-9);
        // billed 1500 against 1000 -> 50% growth -> 100
        assert_eq!(profile.factor(RiskFactor::RevenueGrowth), 100.0);
        assert!(profile.flagged_codes.contains("99215"));
        assert!(profile.high_risk_areas.contains(&RiskFactor::RevenueGrowth));
    }

    #[test]
    fn test_unlisted_and_anomaly_factors() {
        // one of four claims unlisted, one after hours
        let claims = vec![
            claim("C1", "99499", dec!(100), 10),
            claim("C2", "99213", dec!(100), 10),
            claim("C3", "99213", dec!(100), 23),
            claim("C4", "97110", dec!(100), 11),
        ];
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(&claims, Timezone::default());
        let view = PopulationView::new(&claims, &index, &catalog, OperatingHours::default());

        let profile = RiskProfiler.profile(&ProviderId::new("PRV-1"), Some(&[][..]), &view, "unknown");
        assert_eq!(profile.factor(RiskFactor::UnlistedCodeRatio), 100.0);
        assert_eq!(profile.factor(RiskFactor::PatternAnomaly), 100.0);
        assert_eq!(profile.factor(RiskFactor::PeerDeviation), NEUTRAL_FACTOR);
    }

    #[test]
    fn test_risk_levels_and_weights() {
        assert_eq!(RiskLevel::from_score(29.9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(85.0), RiskLevel::Critical);

        let total: f64 = RiskFactor::all().iter().map(|f| f.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_neutral_profile_is_medium() {
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::default();
        let view = PopulationView::new(&[], &index, &catalog, OperatingHours::default());

        let profile = RiskProfiler.profile(&ProviderId::new("PRV-1"), None, &view, "");
        assert!((profile.overall_risk - 50.0).abs() < 1e-9);
        assert_eq!(profile.risk_level, RiskLevel::Medium);
        assert!(profile.high_risk_areas.is_empty());
    }
}
