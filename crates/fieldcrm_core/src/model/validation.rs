//! Input validation errors shared by model, schedule and service layers.
//!
//! # Responsibility
//! - Describe malformed caller input in one error type.
//! - Keep validation failures distinct from storage failures.
//!
//! # Invariants
//! - Validation errors are reported synchronously and never retried.

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Malformed input rejected before any store call is made.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Interval was negative.
    NegativeInterval(i64),
    /// Interval text could not be parsed as a whole number of days.
    InvalidInterval(String),
    /// `reference + interval` is outside the representable calendar.
    DateOutOfRange {
        reference: NaiveDate,
        interval_days: u32,
    },
    /// Action label is neither `call` nor `visit`.
    UnknownAction(String),
    /// Required text field is empty after trimming.
    BlankField(&'static str),
    /// Product tonnage was negative or not finite.
    InvalidTonnage(f64),
    /// Date text is not `YYYY-MM-DD`.
    InvalidDate(String),
    /// Hour of day outside `0..=23`.
    InvalidHour(u32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NegativeInterval(value) => {
                write!(f, "interval must be non-negative, got {value}")
            }
            Self::InvalidInterval(value) => {
                write!(f, "interval must be a whole number of days, got `{value}`")
            }
            Self::DateOutOfRange {
                reference,
                interval_days,
            } => write!(
                f,
                "{reference} + {interval_days} days is outside the supported date range"
            ),
            Self::UnknownAction(value) => {
                write!(f, "unknown action `{value}`; expected call|visit")
            }
            Self::BlankField(field) => write!(f, "{field} cannot be empty"),
            Self::InvalidTonnage(value) => {
                write!(f, "average tonnage must be a non-negative number, got {value}")
            }
            Self::InvalidDate(value) => write!(f, "invalid date `{value}`; expected YYYY-MM-DD"),
            Self::InvalidHour(value) => write!(f, "hour must be within 0..=23, got {value}"),
        }
    }
}

impl Error for ValidationError {}
