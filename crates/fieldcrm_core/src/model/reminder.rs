//! Reminder read model.
//!
//! # Responsibility
//! - Describe one derived (customer, action) reminder for UI rendering.
//! - Classify urgency relative to a given local day.
//!
//! # Invariants
//! - Reminders are never persisted; they are regenerated from customers.
//! - A null due date maps to `Urgency::Unscheduled`, never to a dated class.

use crate::model::customer::{ActionType, CustomerId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Label shown for reminders that have no due date yet.
pub const UNSCHEDULED_LABEL: &str = "not scheduled";

/// Derived classification of a due date relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    DueToday,
    Upcoming,
    /// No due date has been set.
    Unscheduled,
}

impl Urgency {
    /// Classifies `due_date` against `today` (both local days).
    pub fn classify(due_date: Option<NaiveDate>, today: NaiveDate) -> Self {
        match due_date {
            None => Self::Unscheduled,
            Some(due) if due < today => Self::Overdue,
            Some(due) if due == today => Self::DueToday,
            Some(_) => Self::Upcoming,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::DueToday => "due_today",
            Self::Upcoming => "upcoming",
            Self::Unscheduled => "unscheduled",
        }
    }

    /// Whether the action should be performed today at the latest.
    pub fn is_due(self) -> bool {
        matches!(self, Self::Overdue | Self::DueToday)
    }
}

/// One call or visit reminder derived from a customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub customer_id: CustomerId,
    pub customer_name: String,
    #[serde(rename = "type")]
    pub action: ActionType,
    /// Mirrors the customer's `next_X_date`.
    pub due_date: Option<NaiveDate>,
    /// Mirrors the customer's `last_X_date`, shown as context.
    pub last_date: Option<NaiveDate>,
    pub urgency: Urgency,
}

impl Reminder {
    /// Stable display key, e.g. `call-<uuid>`.
    pub fn key(&self) -> String {
        format!("{}-{}", self.action, self.customer_id)
    }

    /// ISO due date, or the unscheduled label.
    pub fn due_label(&self) -> String {
        match self.due_date {
            Some(date) => date.format("%Y-%m-%d").to_string(),
            None => UNSCHEDULED_LABEL.to_string(),
        }
    }
}
