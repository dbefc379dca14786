//! Temporal types for audit runs
//!
//! This module provides:
//! - `AuditPeriod`: the half-open window of service dates under audit
//! - `Timezone`: region time zones used for operating-hour checks
//! - `Clock`: an injectable time source so audit runs are reproducible

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use std::str::FromStr;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must be before end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// Timezone wrapper for provider regions
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Tz::from_str(&s)
            .map(Timezone)
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    /// Parses an IANA timezone name
    pub fn parse(name: &str) -> Result<Self, TemporalError> {
        Tz::from_str(name)
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(name.to_string()))
    }

    /// Resolves the timezone of a provider region
    ///
    /// Saudi regions resolve to Asia/Riyadh; an IANA name is accepted as-is;
    /// anything else falls back to UTC.
    pub fn for_region(region: &str) -> Self {
        match region.trim().to_ascii_lowercase().as_str() {
            "riyadh" | "jeddah" | "makkah" | "mecca" | "madinah" | "medina" | "dammam"
            | "eastern" | "khobar" | "qassim" | "tabuk" | "abha" | "asir" | "jazan"
            | "hail" | "najran" | "al-baha" | "jouf" => Self(chrono_tz::Asia::Riyadh),
            _ => Self::parse(region.trim()).unwrap_or_default(),
        }
    }

    /// Hour of day (0-23) of a UTC instant in this timezone
    pub fn local_hour(&self, utc: DateTime<Utc>) -> u32 {
        utc.with_timezone(&self.0).hour()
    }

    /// Calendar date of a UTC instant in this timezone
    pub fn local_date(&self, utc: DateTime<Utc>) -> NaiveDate {
        utc.with_timezone(&self.0).date_naive()
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self(chrono_tz::UTC)
    }
}

/// The period of service dates covered by an audit
///
/// Start is inclusive and end is exclusive; start must be strictly before end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPeriod {
    /// Start of the period (inclusive)
    pub start: DateTime<Utc>,
    /// End of the period (exclusive)
    pub end: DateTime<Utc>,
}

impl AuditPeriod {
    /// Creates a new audit period
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        let period = Self { start, end };
        period.validate()?;
        Ok(period)
    }

    /// Checks the start-before-end invariant
    ///
    /// Periods arriving through deserialization bypass `new`, so callers
    /// validate explicitly before use.
    pub fn validate(&self) -> Result<(), TemporalError> {
        if self.start >= self.end {
            return Err(TemporalError::InvalidPeriod {
                start: self.start.to_string(),
                end: self.end.to_string(),
            });
        }
        Ok(())
    }

    /// Returns true if this period contains the given timestamp
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Returns the duration of the period
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Stable textual key used when deriving identifiers
    pub fn key(&self) -> String {
        format!("{}..{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Source of the current time
///
/// Every timestamp an audit run records comes from a clock, so injecting a
/// fixed clock makes a run byte-for-byte reproducible.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
