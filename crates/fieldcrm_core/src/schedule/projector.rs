//! Reminder projector.
//!
//! # Responsibility
//! - Derive one call and one visit reminder per customer.
//! - Order and filter reminders for display.
//!
//! # Invariants
//! - Projection is pure: iterating twice over unchanged input yields equal
//!   sequences.
//! - Customers without a due date still produce a reminder
//!   (`Urgency::Unscheduled`).
//! - Sorting is ascending by due date with undated reminders last.

use crate::model::customer::{ActionType, Customer};
use crate::model::reminder::{Reminder, Urgency};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Lazy, restartable view of all reminders for a customer slice.
#[derive(Debug, Clone, Copy)]
pub struct ReminderProjection<'a> {
    customers: &'a [Customer],
    today: NaiveDate,
}

/// Display filter applied after projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderFilter {
    /// Case-insensitive substring of the customer name.
    pub search: Option<String>,
    /// Restrict to one action type.
    pub action: Option<ActionType>,
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &Reminder) -> bool {
        if let Some(action) = self.action {
            if reminder.action != action {
                return false;
            }
        }
        match self.normalized_search() {
            Some(term) => reminder.customer_name.to_lowercase().contains(&term),
            None => true,
        }
    }

    fn normalized_search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
    }
}

/// Projects `customers` into reminders classified against `today`.
pub fn project_reminders(customers: &[Customer], today: NaiveDate) -> ReminderProjection<'_> {
    ReminderProjection { customers, today }
}

impl<'a> ReminderProjection<'a> {
    /// Starts a fresh pass over the projection.
    ///
    /// Order is customer input order, call before visit.
    pub fn iter(&self) -> impl Iterator<Item = Reminder> + Clone + 'a {
        let today = self.today;
        self.customers.iter().flat_map(move |customer| {
            ActionType::ALL
                .into_iter()
                .map(move |action| reminder_for(customer, action, today))
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn len(&self) -> usize {
        self.customers.len() * ActionType::ALL.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// All reminders ordered by due date, undated last.
    pub fn sorted(&self) -> Vec<Reminder> {
        let mut reminders = self.iter().collect::<Vec<_>>();
        sort_by_due_date(&mut reminders);
        reminders
    }

    /// Reminders matching `filter`, ordered by due date, undated last.
    pub fn filtered(&self, filter: &ReminderFilter) -> Vec<Reminder> {
        let mut reminders = self
            .iter()
            .filter(|reminder| filter.matches(reminder))
            .collect::<Vec<_>>();
        sort_by_due_date(&mut reminders);
        reminders
    }
}

/// Builds the reminder for one (customer, action) pair.
pub fn reminder_for(customer: &Customer, action: ActionType, today: NaiveDate) -> Reminder {
    let due_date = customer.next_date(action);
    Reminder {
        customer_id: customer.id,
        customer_name: customer.name.clone(),
        action,
        due_date,
        last_date: customer.last_date(action),
        urgency: Urgency::classify(due_date, today),
    }
}

/// Stable sort by due date; reminders without a due date go last.
pub fn sort_by_due_date(reminders: &mut [Reminder]) {
    reminders.sort_by(|left, right| compare_due_dates(left.due_date, right.due_date));
}

fn compare_due_dates(left: Option<NaiveDate>, right: Option<NaiveDate>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
