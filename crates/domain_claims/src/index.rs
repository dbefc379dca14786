//! Read-only index over a provider's claim population
//!
//! Cross-claim rules (duplicate billing, unbundling, same-day limits) need
//! to see a claim's siblings. The index is built once per run, before any
//! fan-out, and shared immutably by every worker.

use std::collections::HashMap;

use chrono::NaiveDate;

use core_kernel::{ClaimId, PatientId, Timezone};
use crate::claim::Claim;

/// Claims grouped by patient and service date
#[derive(Debug, Clone, Default)]
pub struct ClaimIndex {
    timezone: Timezone,
    by_encounter: HashMap<(PatientId, NaiveDate), Vec<Claim>>,
}

impl ClaimIndex {
    /// Builds the index; service dates are computed in the given timezone
    pub fn new(claims: &[Claim], timezone: Timezone) -> Self {
        let mut by_encounter: HashMap<(PatientId, NaiveDate), Vec<Claim>> = HashMap::new();
        for claim in claims {
            by_encounter
                .entry((claim.patient_id.clone(), claim.service_date(&timezone)))
                .or_default()
                .push(claim.clone());
        }
        for group in by_encounter.values_mut() {
            group.sort_by(|a, b| a.id.cmp(&b.id));
        }
        Self { timezone, by_encounter }
    }

    /// Timezone used for service dates
    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    /// Other claims for the same patient on the same service date
    pub fn same_encounter<'a>(&'a self, claim: &'a Claim) -> impl Iterator<Item = &'a Claim> + 'a {
        let key = (claim.patient_id.clone(), claim.service_date(&self.timezone));
        self.by_encounter
            .get(&key)
            .into_iter()
            .flatten()
            .filter(move |c| c.id != claim.id)
    }

    /// Number of claims for the same patient, date and code, including this one
    pub fn same_day_units(&self, claim: &Claim) -> usize {
        1 + self
            .same_encounter(claim)
            .filter(|c| c.service_code == claim.service_code)
            .count()
    }

    /// Other claims billing the same code for the same patient and date
    ///
    /// Amounts are not compared; a repeat billed at a different price is
    /// still a duplicate.
    pub fn duplicates_of(&self, claim: &Claim) -> Vec<ClaimId> {
        self.same_encounter(claim)
            .filter(|c| c.service_code == claim.service_code)
            .map(|c| c.id.clone())
            .collect()
    }

    /// Number of indexed claims
    pub fn len(&self) -> usize {
        self.by_encounter.values().map(Vec::len).sum()
    }

    /// Returns true if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.by_encounter.is_empty()
    }
}
