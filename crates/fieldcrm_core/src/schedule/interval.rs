//! Interval engine: next-due-date arithmetic.
//!
//! # Responsibility
//! - Own the single `reference + interval` computation used by every caller
//!   (customer creation, completion, interval edits).
//! - Normalize timestamps to local days before adding.
//!
//! # Invariants
//! - Results are local calendar days with no time-of-day component.
//! - Intervals are non-negative; zero yields the reference day itself.

use crate::model::customer::ActionType;
use crate::model::validation::ValidationError;
use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const DEFAULT_CALL_INTERVAL_DAYS: u32 = 7;
pub const DEFAULT_VISIT_INTERVAL_DAYS: u32 = 30;

/// Number of days between two occurrences of the same recurring action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct IntervalDays(u32);

impl IntervalDays {
    pub const fn from_days(days: u32) -> Self {
        Self(days)
    }

    /// Builds an interval from a signed day count.
    ///
    /// # Errors
    /// - `NegativeInterval` for values below zero.
    /// - `InvalidInterval` for values that do not fit in `u32`.
    pub fn new(days: i64) -> Result<Self, ValidationError> {
        if days < 0 {
            return Err(ValidationError::NegativeInterval(days));
        }
        u32::try_from(days)
            .map(Self)
            .map_err(|_| ValidationError::InvalidInterval(days.to_string()))
    }

    /// Parses form input; blank input falls back to `default`.
    ///
    /// Non-numeric text is rejected rather than silently defaulted.
    pub fn parse_or(input: &str, default: IntervalDays) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(default);
        }
        let days = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidInterval(trimmed.to_string()))?;
        Self::new(days)
    }

    /// Built-in default for an action (7 days for calls, 30 for visits).
    pub const fn default_for(action: ActionType) -> Self {
        match action {
            ActionType::Call => Self(DEFAULT_CALL_INTERVAL_DAYS),
            ActionType::Visit => Self(DEFAULT_VISIT_INTERVAL_DAYS),
        }
    }

    pub const fn days(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for IntervalDays {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IntervalDays> for i64 {
    fn from(value: IntervalDays) -> Self {
        i64::from(value.0)
    }
}

impl Display for IntervalDays {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// Intervals applied when a customer form leaves them blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleDefaults {
    pub call: IntervalDays,
    pub visit: IntervalDays,
}

impl ScheduleDefaults {
    pub fn for_action(&self, action: ActionType) -> IntervalDays {
        match action {
            ActionType::Call => self.call,
            ActionType::Visit => self.visit,
        }
    }
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            call: IntervalDays::default_for(ActionType::Call),
            visit: IntervalDays::default_for(ActionType::Visit),
        }
    }
}

/// Anything that can be reduced to a local calendar day.
pub trait LocalDay {
    fn local_day(&self) -> NaiveDate;
}

impl LocalDay for NaiveDate {
    fn local_day(&self) -> NaiveDate {
        *self
    }
}

impl LocalDay for NaiveDateTime {
    fn local_day(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> LocalDay for DateTime<Tz> {
    fn local_day(&self) -> NaiveDate {
        self.with_timezone(&Local).date_naive()
    }
}

/// Returns `reference`'s local day plus `interval` calendar days.
///
/// # Errors
/// - `DateOutOfRange` when the sum leaves chrono's supported range.
pub fn compute_next_due_date(
    reference: impl LocalDay,
    interval: IntervalDays,
) -> Result<NaiveDate, ValidationError> {
    let day = reference.local_day();
    day.checked_add_days(Days::new(u64::from(interval.days())))
        .ok_or(ValidationError::DateOutOfRange {
            reference: day,
            interval_days: interval.days(),
        })
}

/// Current local day.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Parses a `YYYY-MM-DD` day.
pub fn parse_day(value: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{compute_next_due_date, parse_day, IntervalDays};
    use crate::model::customer::ActionType;
    use crate::model::validation::ValidationError;
    use chrono::{Local, NaiveDate, TimeZone};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn adds_exact_calendar_days_and_drops_time_of_day() {
        let reference = day(2024, 6, 10).and_hms_opt(23, 59, 59).unwrap();
        for d in 0..=400u32 {
            let next = compute_next_due_date(reference, IntervalDays::from_days(d)).unwrap();
            assert_eq!((next - day(2024, 6, 10)).num_days(), i64::from(d));
        }
    }

    #[test]
    fn zero_interval_is_same_day() {
        let next = compute_next_due_date(day(2024, 6, 10), IntervalDays::from_days(0)).unwrap();
        assert_eq!(next, day(2024, 6, 10));
    }

    #[test]
    fn crosses_month_year_and_leap_day() {
        let seven = IntervalDays::from_days(7);
        assert_eq!(
            compute_next_due_date(day(2024, 2, 26), seven).unwrap(),
            day(2024, 3, 4)
        );
        assert_eq!(
            compute_next_due_date(day(2024, 12, 28), seven).unwrap(),
            day(2025, 1, 4)
        );
        assert_eq!(
            compute_next_due_date(day(2024, 2, 28), IntervalDays::from_days(1)).unwrap(),
            day(2024, 2, 29)
        );
    }

    #[test]
    fn local_timestamp_is_normalized_to_its_local_day() {
        let noon = Local
            .with_ymd_and_hms(2024, 6, 10, 12, 0, 0)
            .earliest()
            .unwrap();
        let next = compute_next_due_date(noon, IntervalDays::from_days(7)).unwrap();
        assert_eq!(next, day(2024, 6, 17));
    }

    #[test]
    fn overflow_is_reported_not_panicked() {
        let err = compute_next_due_date(NaiveDate::MAX, IntervalDays::from_days(1)).unwrap_err();
        assert!(matches!(err, ValidationError::DateOutOfRange { .. }));
    }

    #[test]
    fn negative_interval_is_rejected() {
        assert_eq!(
            IntervalDays::new(-1).unwrap_err(),
            ValidationError::NegativeInterval(-1)
        );
        assert_eq!(IntervalDays::new(0).unwrap().days(), 0);
    }

    #[test]
    fn parse_or_defaults_blank_and_rejects_garbage() {
        let fallback = IntervalDays::default_for(ActionType::Visit);
        assert_eq!(IntervalDays::parse_or("  ", fallback).unwrap().days(), 30);
        assert_eq!(IntervalDays::parse_or(" 14 ", fallback).unwrap().days(), 14);
        assert!(matches!(
            IntervalDays::parse_or("two weeks", fallback).unwrap_err(),
            ValidationError::InvalidInterval(_)
        ));
        assert!(matches!(
            IntervalDays::parse_or("-3", fallback).unwrap_err(),
            ValidationError::NegativeInterval(-3)
        ));
    }

    #[test]
    fn parse_day_accepts_iso_dates_only() {
        assert_eq!(parse_day("2024-06-10").unwrap(), day(2024, 6, 10));
        assert!(parse_day("10.06.2024").is_err());
    }
}
