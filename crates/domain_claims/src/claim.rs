//! Claim aggregate

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, PatientId, ProviderId, Timezone};
use crate::error::ClaimError;

/// Default threshold above which a claim counts as high value (SAR)
pub const HIGH_VALUE_THRESHOLD: Decimal = dec!(10000);

/// A claim submitted by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Claim identifier assigned by the submitting system
    pub id: ClaimId,
    /// Submitting provider
    pub provider_id: ProviderId,
    /// Patient the service was rendered to
    pub patient_id: PatientId,
    /// Billed amount
    pub amount: Decimal,
    /// Billing code of the service
    pub service_code: String,
    /// Diagnosis codes supporting the service
    #[serde(default)]
    pub diagnosis_codes: Vec<String>,
    /// Reference to the clinical documentation
    #[serde(default)]
    pub documentation_ref: Option<String>,
    /// When the service started
    pub service_start: DateTime<Utc>,
    /// When the service ended
    #[serde(default)]
    pub service_end: Option<DateTime<Utc>>,
    /// Service category (e.g. "rehabilitation")
    #[serde(default)]
    pub service_category: Option<String>,
}

impl Claim {
    /// Returns true if the amount is strictly above the threshold
    pub fn is_high_value(&self, threshold: Decimal) -> bool {
        self.amount > threshold
    }

    /// Calendar date of service in the given timezone
    pub fn service_date(&self, tz: &Timezone) -> NaiveDate {
        tz.local_date(self.service_start)
    }

    /// Returns true if the service started outside operating hours
    pub fn is_after_hours(&self, tz: &Timezone, hours: &OperatingHours) -> bool {
        !hours.contains(tz.local_hour(self.service_start))
    }

    /// End of the service window, or the start for point-in-time services
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.service_end.unwrap_or(self.service_start)
    }

    /// Returns true if both claims have a service window and the windows overlap
    pub fn overlaps(&self, other: &Claim) -> bool {
        match (self.service_end, other.service_end) {
            (Some(self_end), Some(other_end)) => {
                self.service_start < other_end && other.service_start < self_end
            }
            _ => false,
        }
    }

    /// Returns true if the category matches the focus area (case-insensitive)
    pub fn matches_category(&self, area: &str) -> bool {
        self.service_category
            .as_deref()
            .map(|c| c.trim().eq_ignore_ascii_case(area.trim()))
            .unwrap_or(false)
    }

    /// First significant digit of the billed amount (1-9)
    ///
    /// Returns None for zero or negative amounts.
    pub fn leading_digit(&self) -> Option<u8> {
        if self.amount <= Decimal::ZERO {
            return None;
        }
        self.amount
            .normalize()
            .to_string()
            .chars()
            .find(|c| matches!(c, '1'..='9'))
            .and_then(|c| c.to_digit(10))
            .map(|d| d as u8)
    }

    /// Checks the structural invariants a rule relies on
    pub fn validate_shape(&self) -> Result<(), ClaimError> {
        self.check_shape().map_err(|err| {
            tracing::warn!(
                claim_id = %self.id,
                provider_id = %self.provider_id,
                error = %err,
                "Claim failed shape validation"
            );
            err
        })
    }

    fn check_shape(&self) -> Result<(), ClaimError> {
        if self.id.is_blank() {
            return Err(ClaimError::malformed("<blank>", "claim id is blank"));
        }
        if self.service_code.trim().is_empty() {
            return Err(ClaimError::malformed(self.id.as_str(), "service code is blank"));
        }
        if self.patient_id.is_blank() {
            return Err(ClaimError::malformed(self.id.as_str(), "patient id is blank"));
        }
        if self.amount < Decimal::ZERO {
            return Err(ClaimError::NegativeAmount(self.id.to_string()));
        }
        if let Some(end) = self.service_end {
            if end < self.service_start {
                return Err(ClaimError::InvertedServiceWindow {
                    claim_id: self.id.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Normal operating hours of a provider, in region-local time
///
/// `open_hour` is inclusive and `close_hour` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl OperatingHours {
    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.open_hour && hour < self.close_hour
    }
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open_hour: 7,
            close_hour: 22,
        }
    }
}
