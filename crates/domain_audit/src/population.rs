//! Read-only view over a provider's claim population
//!
//! Built once per run before sampling. The profiler, the sampler and the
//! fraud detector all ask the same questions of a claim (is it after hours,
//! is it a same-day repeat, is its code unlisted), so the answers live here.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use domain_claims::{Claim, ClaimIndex, OperatingHours};
use domain_rules::CodeCatalog;

/// Size and value of a claim population
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub claim_count: usize,
    pub total_billed: Decimal,
}

/// A population together with the reference data needed to interpret it
#[derive(Debug, Clone, Copy)]
pub struct PopulationView<'a> {
    /// Claims ordered by claim id
    pub claims: &'a [Claim],
    pub index: &'a ClaimIndex,
    pub catalog: &'a CodeCatalog,
    pub hours: OperatingHours,
}

impl<'a> PopulationView<'a> {
    pub fn new(
        claims: &'a [Claim],
        index: &'a ClaimIndex,
        catalog: &'a CodeCatalog,
        hours: OperatingHours,
    ) -> Self {
        Self {
            claims,
            index,
            catalog,
            hours,
        }
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Service started outside operating hours in region-local time
    pub fn is_after_hours(&self, claim: &Claim) -> bool {
        claim.is_after_hours(self.index.timezone(), &self.hours)
    }

    /// Same code billed more than once for the patient that day
    pub fn is_same_day_repeat(&self, claim: &Claim) -> bool {
        self.index.same_day_units(claim) > 1
    }

    /// Service window overlaps another service for the same patient
    pub fn has_overlap(&self, claim: &Claim) -> bool {
        self.index.same_encounter(claim).any(|other| claim.overlaps(other))
    }

    /// Code is unknown to the catalog or unlisted in it
    pub fn is_unlisted(&self, claim: &Claim) -> bool {
        !self.catalog.is_listed(&claim.service_code)
    }

    /// Claim category, falling back to the catalog category of its code
    pub fn matches_area(&self, claim: &Claim, area: &str) -> bool {
        match claim.service_category {
            Some(_) => claim.matches_category(area),
            None => self
                .catalog
                .category_of(&claim.service_code)
                .map(|c| c.eq_ignore_ascii_case(area.trim()))
                .unwrap_or(false),
        }
    }

    /// Share of claims satisfying the predicate; None for an empty population
    pub fn share_where(&self, predicate: impl Fn(&Claim) -> bool) -> Option<f64> {
        if self.claims.is_empty() {
            return None;
        }
        let hits = self.claims.iter().filter(|c| predicate(c)).count();
        Some(hits as f64 / self.claims.len() as f64)
    }

    pub fn total_billed(&self) -> Decimal {
        self.claims.iter().map(|c| c.amount).sum()
    }

    pub fn mean_amount(&self) -> Option<Decimal> {
        if self.claims.is_empty() {
            return None;
        }
        Some(self.total_billed() / Decimal::from(self.claims.len()))
    }

    /// Median billed amount
    pub fn median_amount(&self) -> Option<Decimal> {
        if self.claims.is_empty() {
            return None;
        }
        let mut amounts: Vec<Decimal> = self.claims.iter().map(|c| c.amount).collect();
        amounts.sort();
        let mid = amounts.len() / 2;
        if amounts.len() % 2 == 0 {
            Some((amounts[mid - 1] + amounts[mid]) / dec!(2))
        } else {
            Some(amounts[mid])
        }
    }

    pub fn summary(&self) -> PopulationSummary {
        PopulationSummary {
            claim_count: self.claims.len(),
            total_billed: self.total_billed(),
        }
    }
}

/// Lossy conversion for statistics; amounts in SAR fit comfortably in f64
pub(crate) fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use core_kernel::{ClaimId, PatientId, ProviderId, Timezone};
    use rust_decimal_macros::dec;

    fn claim(id: &str, code: &str, amount: Decimal, category: Option<&str>) -> Claim {
        Claim {
            id: ClaimId::new(id),
            provider_id: ProviderId::new("PRV-1"),
            patient_id: PatientId::new(id),
            amount,
            service_code: code.to_string(),
            diagnosis_codes: vec![],
            documentation_ref: None,
            service_start: Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap(),
            service_end: None,
            service_category: category.map(str::to_string),
        }
    }

    #[test]
    fn test_statistics() {
        let claims = vec![
            claim("C1", "99213", dec!(100), None),
            claim("C2", "99213", dec!(300), None),
            claim("C3", "99213", dec!(200), None),
            claim("C4", "99213", dec!(1000), None),
        ];
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(&claims, Timezone::default());
        let view = PopulationView::new(&claims, &index, &catalog, OperatingHours::default());

        assert_eq!(view.median_amount(), Some(dec!(250)));
        assert_eq!(view.mean_amount(), Some(dec!(400)));
        assert_eq!(view.summary().total_billed, dec!(1600));
    }

    #[test]
    fn test_area_falls_back_to_catalog_category() {
        let claims = vec![
            claim("C1", "97110", dec!(100), None),
            claim("C2", "99213", dec!(100), Some("Rehabilitation")),
            claim("C3", "99213", dec!(100), None),
        ];
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::new(&claims, Timezone::default());
        let view = PopulationView::new(&claims, &index, &catalog, OperatingHours::default());

        assert!(view.matches_area(&claims[0], "rehabilitation"));
        assert!(view.matches_area(&claims[1], "rehabilitation"));
        assert!(!view.matches_area(&claims[2], "rehabilitation"));
    }

    #[test]
    fn test_empty_population_has_no_share() {
        let catalog = CodeCatalog::standard().unwrap();
        let index = ClaimIndex::default();
        let view = PopulationView::new(&[], &index, &catalog, OperatingHours::default());
        assert_eq!(view.share_where(|_| true), None);
        assert_eq!(view.median_amount(), None);
    }
}
