//! Calendar use-case service.
//!
//! # Responsibility
//! - Schedule planned calls/visits on specific days.
//! - Build the day-by-day window rendered by the calendar view.
//!
//! # Invariants
//! - A window always has exactly the requested (clamped) number of days,
//!   including days without entries.

use crate::model::customer::{ActionType, CustomerId};
use crate::repo::calendar_repo::{CalendarEntry, CalendarEntryId, CalendarRepository};
use crate::repo::customer_repo::StoreResult;
use crate::schedule::interval::{compute_next_due_date, IntervalDays};
use chrono::NaiveDate;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW_DAYS: u32 = 30;
pub const MAX_WINDOW_DAYS: u32 = 90;

/// One calendar cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub entries: Vec<CalendarEntry>,
}

/// Calendar facade over a calendar repository.
pub struct CalendarService<R: CalendarRepository> {
    repo: R,
    window_days: u32,
}

impl<R: CalendarRepository> CalendarService<R> {
    pub fn new(repo: R) -> Self {
        Self::with_window(repo, DEFAULT_WINDOW_DAYS)
    }

    /// Uses `window_days` (clamped to `1..=90`) when callers pass no size.
    pub fn with_window(repo: R, window_days: u32) -> Self {
        Self {
            repo,
            window_days: normalize_window_days(Some(window_days)),
        }
    }

    /// Plans `action` for `customer_id` on `date`.
    pub fn schedule_entry(
        &self,
        customer_id: CustomerId,
        date: NaiveDate,
        action: ActionType,
        notes: Option<String>,
    ) -> StoreResult<CalendarEntry> {
        let entry = CalendarEntry::new(customer_id, date, action, notes);
        self.repo.create_entry(&entry)?;
        info!("event=calendar_schedule module=service status=ok action={action}");
        Ok(entry)
    }

    pub fn remove_entry(&self, id: CalendarEntryId) -> StoreResult<()> {
        self.repo.delete_entry(id)
    }

    /// Returns `days` consecutive days starting at `start` with their entries.
    pub fn window(&self, start: NaiveDate, days: Option<u32>) -> StoreResult<Vec<CalendarDay>> {
        let days = days.map_or(self.window_days, |value| normalize_window_days(Some(value)));
        let end = compute_next_due_date(start, IntervalDays::from_days(days - 1))?;

        let mut by_day: BTreeMap<NaiveDate, Vec<CalendarEntry>> = BTreeMap::new();
        for entry in self.repo.list_entries(start, end)? {
            by_day.entry(entry.date).or_default().push(entry);
        }

        Ok(start
            .iter_days()
            .take(days as usize)
            .map(|date| CalendarDay {
                date,
                entries: by_day.remove(&date).unwrap_or_default(),
            })
            .collect())
    }
}

/// Clamps a requested window size to `1..=90`, defaulting to 30.
pub fn normalize_window_days(days: Option<u32>) -> u32 {
    match days {
        Some(0) | None => DEFAULT_WINDOW_DAYS,
        Some(value) if value > MAX_WINDOW_DAYS => MAX_WINDOW_DAYS,
        Some(value) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_window_days;

    #[test]
    fn window_days_are_clamped() {
        assert_eq!(normalize_window_days(None), 30);
        assert_eq!(normalize_window_days(Some(0)), 30);
        assert_eq!(normalize_window_days(Some(7)), 7);
        assert_eq!(normalize_window_days(Some(365)), 90);
    }
}
