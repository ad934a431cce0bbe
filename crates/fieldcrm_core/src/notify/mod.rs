//! Session and notification collaborator.
//!
//! # Responsibility
//! - Abstract the signed-in session and user notifications behind one trait.
//! - Build the daily digest message and compute when it is next due.
//!
//! # Invariants
//! - Nothing here arms timers or persists state; callers decide when to
//!   deliver the digest.

use crate::model::customer::ActionType;
use crate::model::reminder::Reminder;
use crate::model::validation::ValidationError;
use chrono::{Days, NaiveDateTime, NaiveTime};
use log::info;

pub const DEFAULT_DIGEST_HOUR: u32 = 9;
pub const DIGEST_TITLE: &str = "Daily Tasks";

/// User-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

/// Session and notification surface provided by the UI shell.
pub trait SessionNotifier {
    /// Signed-in user identifier, if any.
    fn current_user(&self) -> Option<String>;
    fn sign_out(&mut self);
    fn notify(&self, notification: &Notification);
}

/// Notifier that writes notifications to the core log.
///
/// Used by headless callers (CLI, tests) that have no notification UI.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    user: Option<String>,
}

impl LogNotifier {
    pub fn new(user: Option<String>) -> Self {
        Self { user }
    }
}

impl SessionNotifier for LogNotifier {
    fn current_user(&self) -> Option<String> {
        self.user.clone()
    }

    fn sign_out(&mut self) {
        self.user = None;
        info!("event=session_sign_out module=notify status=ok");
    }

    fn notify(&self, notification: &Notification) {
        info!(
            "event=notification module=notify status=ok title={:?} body={:?}",
            notification.title, notification.body
        );
    }
}

/// Builds the digest counting calls and visits that are due or overdue.
pub fn daily_digest(reminders: &[Reminder]) -> Notification {
    let due = |action: ActionType| {
        reminders
            .iter()
            .filter(|reminder| reminder.action == action && reminder.urgency.is_due())
            .count()
    };
    Notification {
        title: DIGEST_TITLE.to_string(),
        body: format!(
            "You have {} calls and {} visits scheduled for today.",
            due(ActionType::Call),
            due(ActionType::Visit)
        ),
    }
}

/// Delivers the digest through `notifier` when a user is signed in.
///
/// Returns the delivered notification, or `None` without a session.
pub fn send_daily_digest(
    notifier: &impl SessionNotifier,
    reminders: &[Reminder],
) -> Option<Notification> {
    notifier.current_user()?;
    let notification = daily_digest(reminders);
    notifier.notify(&notification);
    Some(notification)
}

/// Next local time at `hour:00` that is not before `now`.
///
/// A `now` exactly on the slot returns that slot.
pub fn next_digest_time(now: NaiveDateTime, hour: u32) -> Result<NaiveDateTime, ValidationError> {
    let slot_time =
        NaiveTime::from_hms_opt(hour, 0, 0).ok_or(ValidationError::InvalidHour(hour))?;
    let today_slot = now.date().and_time(slot_time);
    if now <= today_slot {
        return Ok(today_slot);
    }
    now.date()
        .checked_add_days(Days::new(1))
        .map(|tomorrow| tomorrow.and_time(slot_time))
        .ok_or(ValidationError::DateOutOfRange {
            reference: now.date(),
            interval_days: 1,
        })
}
