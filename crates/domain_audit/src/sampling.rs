//! Stratified Claim Sampling
//!
//! Builds the audit sample in four ordered strata. Each stratum draws
//! without replacement from claims not chosen by an earlier one:
//!
//! ```text
//! 1. high value      amount > 10,000 SAR           30% of sample_size
//! 2. focus area      category matches a focus area 20%, split per area
//! 3. risk pattern    matches a high-risk area      25%, split per area
//! 4. random fill     anything left                 remaining slots
//! ```
//!
//! Quotas are integer floors. The population is ordered by claim id before
//! any draw and every draw uses one generator seeded from the configuration,
//! so the same inputs always yield the same sample.

use std::collections::{BTreeMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use core_kernel::ClaimId;
use domain_claims::claim::HIGH_VALUE_THRESHOLD;
use domain_claims::Claim;

use crate::config::AuditConfiguration;
use crate::population::PopulationView;
use crate::risk::{RiskFactor, RiskProfile};

const HIGH_VALUE_SHARE: usize = 30;
const FOCUS_AREA_SHARE: usize = 20;
const RISK_PATTERN_SHARE: usize = 25;

/// Stratum a claim was drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    HighValue,
    FocusArea,
    RiskPattern,
    Random,
}

/// A claim selected for audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampledClaim {
    pub claim_id: ClaimId,
    pub stratum: Stratum,
    /// Focus area or risk factor the claim was drawn for
    #[serde(default)]
    pub area: Option<String>,
}

/// Ordered, duplicate-free selection of claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSample {
    /// Sample size the caller asked for
    pub requested: u32,
    /// Selected claims in draw order
    pub entries: Vec<SampledClaim>,
}

impl AuditSample {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn claim_ids(&self) -> impl Iterator<Item = &ClaimId> {
        self.entries.iter().map(|e| &e.claim_id)
    }

    pub fn contains(&self, claim_id: &ClaimId) -> bool {
        self.entries.iter().any(|e| &e.claim_id == claim_id)
    }

    /// Number of claims drawn per stratum
    pub fn stratum_counts(&self) -> BTreeMap<Stratum, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.stratum).or_insert(0) += 1;
        }
        counts
    }
}

/// Draws audit samples
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    /// Amount above which a claim is high value
    pub high_value_threshold: Decimal,
}

impl Default for Sampler {
    fn default() -> Self {
        Self {
            high_value_threshold: HIGH_VALUE_THRESHOLD,
        }
    }
}

impl Sampler {
    /// Draws the sample for a run
    ///
    /// `population.claims` must be ordered by claim id and free of duplicate
    /// ids; the orchestrator guarantees both.
    pub fn sample(
        &self,
        population: &PopulationView<'_>,
        profile: &RiskProfile,
        config: &AuditConfiguration,
    ) -> AuditSample {
        let requested = config.sample_size as usize;
        let target = requested.min(population.len());
        let mut draw = Draw {
            rng: StdRng::seed_from_u64(config.random_seed),
            claims: population.claims,
            chosen: HashSet::with_capacity(target),
            entries: Vec::with_capacity(target),
            target,
        };

        if config.risk_based_sampling {
            let threshold = self.high_value_threshold;
            draw.stratum(
                requested * HIGH_VALUE_SHARE / 100,
                Stratum::HighValue,
                None,
                |c| c.is_high_value(threshold),
            );

            let areas: Vec<&String> = config
                .focus_areas
                .iter()
                .filter(|a| !a.trim().is_empty())
                .collect();
            if !areas.is_empty() {
                let per_area = requested * FOCUS_AREA_SHARE / 100 / areas.len();
                for area in areas {
                    draw.stratum(per_area, Stratum::FocusArea, Some(area.trim().to_string()), |c| {
                        population.matches_area(c, area)
                    });
                }
            }

            if !profile.high_risk_areas.is_empty() {
                let median = population.median_amount().unwrap_or_default();
                let per_area = requested * RISK_PATTERN_SHARE / 100 / profile.high_risk_areas.len();
                for factor in &profile.high_risk_areas {
                    draw.stratum(per_area, Stratum::RiskPattern, Some(factor.to_string()), |c| {
                        matches_risk_pattern(*factor, c, population, profile, median)
                    });
                }
            }
        }

        let remaining = draw.remaining();
        draw.stratum(remaining, Stratum::Random, None, |_| true);

        let sample = AuditSample {
            requested: config.sample_size,
            entries: draw.entries,
        };
        info!(
            provider_id = %config.provider_id,
            requested = requested,
            population = population.len(),
            sampled = sample.len(),
            risk_based = config.risk_based_sampling,
            "Audit sample drawn"
        );
        sample
    }
}

/// Whether a claim exhibits the pattern behind a high-risk factor
pub fn matches_risk_pattern(
    factor: RiskFactor,
    claim: &Claim,
    population: &PopulationView<'_>,
    profile: &RiskProfile,
    median_amount: Decimal,
) -> bool {
    match factor {
        RiskFactor::HistoricalCompliance => profile.flagged_codes.contains(claim.service_code.trim()),
        RiskFactor::PatternAnomaly => {
            population.is_after_hours(claim) || population.is_same_day_repeat(claim)
        }
        RiskFactor::UnlistedCodeRatio => population.is_unlisted(claim),
        RiskFactor::RevenueGrowth => claim.amount > median_amount * Decimal::from(2),
        RiskFactor::PeerDeviation => population.catalog.is_top_tier(&claim.service_code),
    }
}

/// Sampling state shared by the strata of one draw
struct Draw<'a> {
    rng: StdRng,
    claims: &'a [Claim],
    chosen: HashSet<ClaimId>,
    entries: Vec<SampledClaim>,
    target: usize,
}

impl<'a> Draw<'a> {
    fn remaining(&self) -> usize {
        self.target.saturating_sub(self.entries.len())
    }

    /// Draws up to `quota` unchosen claims matching the predicate
    fn stratum(
        &mut self,
        quota: usize,
        stratum: Stratum,
        area: Option<String>,
        predicate: impl Fn(&Claim) -> bool,
    ) {
        let quota = quota.min(self.remaining());
        if quota == 0 {
            return;
        }
        let candidates: Vec<&Claim> = self
            .claims
            .iter()
            .filter(|c| !self.chosen.contains(&c.id) && predicate(c))
            .collect();
        let amount = quota.min(candidates.len());

        for i in index::sample(&mut self.rng, candidates.len(), amount).into_iter() {
            let claim = candidates[i];
            self.chosen.insert(claim.id.clone());
            self.entries.push(SampledClaim {
                claim_id: claim.id.clone(),
                stratum,
                area: area.clone(),
            });
        }
        debug!(
            stratum = ?stratum,
            area = area.as_deref().unwrap_or("-"),
            quota = quota,
            candidates = candidates.len(),
            drawn = amount,
            "Stratum drawn"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::{RiskLevel, NEUTRAL_FACTOR};
    use chrono::{Duration, TimeZone, Utc};
    use core_kernel::{AuditPeriod, PatientId, ProviderId, Timezone};
    use domain_claims::{ClaimIndex, OperatingHours};
    use domain_rules::CodeCatalog;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn population(size: usize, high_value: usize) -> Vec<Claim> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        (0..size)
            .map(|i| Claim {
                id: ClaimId::new(format!("CLM-{:04}", i)),
                provider_id: ProviderId::new("PRV-1"),
                patient_id: PatientId::new(format!("PAT-{}", i % 37)),
                amount: if i < high_value { dec!(15000) } else { dec!(250) },
                service_code: if i % 5 == 0 { "97110" } else { "99213" }.to_string(),
                diagnosis_codes: vec![],
                documentation_ref: None,
                service_start: base + Duration::days((i % 90) as i64),
                service_end: None,
                service_category: None,
            })
            .collect()
    }

    fn neutral_profile(high_risk_areas: Vec<RiskFactor>) -> RiskProfile {
        RiskProfile {
            provider_id: ProviderId::new("PRV-1"),
            factors: RiskFactor::all().into_iter().map(|f| (f, NEUTRAL_FACTOR)).collect(),
            overall_risk: NEUTRAL_FACTOR,
            risk_level: RiskLevel::Medium,
            high_risk_areas,
            flagged_codes: BTreeSet::new(),
        }
    }

    fn config(sample_size: u32, risk_based: bool, focus: &[&str], seed: u64) -> AuditConfiguration {
        AuditConfiguration {
            provider_id: "PRV-1".to_string(),
            audit_period: AuditPeriod::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            )
            .unwrap(),
            sample_size,
            risk_based_sampling: risk_based,
            focus_areas: focus.iter().map(|s| s.to_string()).collect(),
            region: "riyadh".to_string(),
            rule_version: "2.0".to_string(),
            random_seed: seed,
        }
    }

    fn draw(claims: &[Claim], profile: &RiskProfile, config: &AuditConfiguration) -> AuditSample {
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(claims, Timezone::default());
        let view = PopulationView::new(claims, &index, &catalog, OperatingHours::default());
        Sampler::default().sample(&view, profile, config)
    }

    #[test]
    fn test_stratified_scenario() {
        let claims = population(200, 40);
        let sample = draw(&claims, &neutral_profile(vec![]), &config(100, true, &["rehabilitation"], 42));

        let counts = sample.stratum_counts();
        assert_eq!(sample.len(), 100);
        assert_eq!(counts.get(&Stratum::HighValue), Some(&30));
        assert_eq!(counts.get(&Stratum::FocusArea), Some(&20));
        assert_eq!(counts.get(&Stratum::Random), Some(&50));

        let unique: HashSet<_> = sample.claim_ids().collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let claims = population(150, 10);
        let profile = neutral_profile(vec![RiskFactor::PeerDeviation]);
        let a = draw(&claims, &profile, &config(40, true, &[], 9));
        let b = draw(&claims, &profile, &config(40, true, &[], 9));
        let c = draw(&claims, &profile, &config(40, true, &[], 10));

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_sample_capped_at_population() {
        let claims = population(12, 3);
        let sample = draw(&claims, &neutral_profile(vec![]), &config(50, true, &[], 1));
        assert_eq!(sample.len(), 12);
        assert_eq!(sample.requested, 50);
    }

    #[test]
    fn test_uniform_sampling_ignores_strata() {
        let claims = population(80, 40);
        let sample = draw(&claims, &neutral_profile(vec![]), &config(20, false, &["rehabilitation"], 3));
        assert_eq!(sample.len(), 20);
        assert!(sample.entries.iter().all(|e| e.stratum == Stratum::Random));
    }

    #[test]
    fn test_risk_pattern_stratum_split_per_area() {
        let mut claims = population(200, 0);
        // two after-hours claims; nothing bills above twice the median
        claims[3].service_start = claims[3].service_start + Duration::hours(14);
        claims[4].service_start = claims[4].service_start + Duration::hours(14);
        let profile = neutral_profile(vec![RiskFactor::PatternAnomaly, RiskFactor::RevenueGrowth]);
        let sample = draw(&claims, &profile, &config(100, true, &[], 5));

        let pattern: Vec<_> = sample
            .entries
            .iter()
            .filter(|e| e.stratum == Stratum::RiskPattern)
            .collect();
        assert_eq!(pattern.len(), 2);
        assert!(pattern.iter().all(|e| e.area.as_deref() == Some("pattern_anomaly")));
        assert_eq!(sample.len(), 100);
    }
}
