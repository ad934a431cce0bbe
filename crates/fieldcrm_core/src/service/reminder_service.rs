//! Reminder use-case service.
//!
//! # Responsibility
//! - Fetch customers and project them into the reminder list.
//! - Route completions from the reminder list to the completion writer.
//!
//! # Invariants
//! - One store select per listing, one store update per completion.
//! - Listings are re-projected from fresh rows; nothing is cached.

use crate::model::customer::{ActionRecord, ActionType, CustomerId};
use crate::model::reminder::Reminder;
use crate::repo::customer_repo::{CustomerListQuery, CustomerRepository, StoreResult};
use crate::schedule::interval::LocalDay;
use crate::schedule::projector::{project_reminders, ReminderFilter};
use crate::service::completion_service::{CompletionError, CompletionService};
use chrono::NaiveDate;
use log::debug;

/// Reminder page facade.
pub struct ReminderService<R: CustomerRepository> {
    completion: CompletionService<R>,
}

impl<R: CustomerRepository> ReminderService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            completion: CompletionService::new(repo),
        }
    }

    /// Reminders matching `filter`, sorted by due date with undated last.
    pub fn due_reminders(
        &self,
        filter: &ReminderFilter,
        today: NaiveDate,
    ) -> StoreResult<Vec<Reminder>> {
        let customers = self
            .completion
            .repo()
            .list_customers(&CustomerListQuery::default())?;
        let reminders = project_reminders(&customers, today).filtered(filter);
        debug!(
            "event=reminders_list module=service status=ok customers={} reminders={}",
            customers.len(),
            reminders.len()
        );
        Ok(reminders)
    }

    /// Completes the reminder identified by (customer, action).
    pub fn complete(
        &self,
        customer_id: CustomerId,
        action: ActionType,
        performed_at: impl LocalDay,
    ) -> Result<ActionRecord, CompletionError> {
        self.completion
            .complete_by_id(customer_id, action, performed_at)
    }
}
