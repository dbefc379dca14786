//! Unit tests for the Temporal module
//!
//! Tests cover AuditPeriod, Timezone region resolution, and clocks.

use core_kernel::{AuditPeriod, Clock, FixedClock, SystemClock, Timezone};
use core_kernel::temporal::TemporalError;
use chrono::{Duration, NaiveDate, TimeZone, Utc};

mod audit_period {
    use super::*;

    fn h1_2024() -> AuditPeriod {
        AuditPeriod::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_start_is_inclusive() {
        let period = h1_2024();
        assert!(period.contains(period.start));
    }

    #[test]
    fn test_end_is_exclusive() {
        let period = h1_2024();
        assert!(!period.contains(period.end));
        assert!(period.contains(period.end - Duration::seconds(1)));
    }

    #[test]
    fn test_duration() {
        assert_eq!(h1_2024().duration().num_days(), 182);
    }

    #[test]
    fn test_inverted_period_is_rejected() {
        let result = AuditPeriod::new(
            Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        assert!(matches!(result, Err(TemporalError::InvalidPeriod { .. })));
    }

    #[test]
    fn test_deserialized_period_is_validated_explicitly() {
        let json = r#"{"start":"2024-07-01T00:00:00Z","end":"2024-01-01T00:00:00Z"}"#;
        let period: AuditPeriod = serde_json::from_str(json).unwrap();
        assert!(period.validate().is_err());
    }

    #[test]
    fn test_key_is_stable() {
        assert_eq!(h1_2024().key(), h1_2024().key());
    }
}

mod timezone {
    use super::*;

    #[test]
    fn test_saudi_regions_share_riyadh_time() {
        for region in ["Riyadh", "jeddah", " Dammam "] {
            assert_eq!(Timezone::for_region(region), Timezone(chrono_tz::Asia::Riyadh));
        }
    }

    #[test]
    fn test_local_date_rolls_over() {
        let tz = Timezone::for_region("Riyadh");
        let utc = Utc.with_ymd_and_hms(2024, 3, 1, 22, 0, 0).unwrap();
        assert_eq!(tz.local_date(utc), NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(tz.local_hour(utc), 1);
    }

    #[test]
    fn test_timezone_serde() {
        let tz = Timezone::for_region("Riyadh");
        let json = serde_json::to_string(&tz).unwrap();
        assert_eq!(json, "\"Asia/Riyadh\"");
        let back: Timezone = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tz);
    }

    #[test]
    fn test_parse_unknown_timezone() {
        assert!(matches!(
            Timezone::parse("Nowhere/Land"),
            Err(TemporalError::UnknownTimezone(_))
        ));
    }
}

mod clocks {
    use super::*;

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }

    #[test]
    fn test_fixed_clock_is_frozen() {
        let instant = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let clock: Box<dyn Clock> = Box::new(FixedClock(instant));
        assert_eq!(clock.now(), instant);
    }
}
