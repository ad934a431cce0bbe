//! Core domain logic for FieldCRM.
//! This crate owns scheduling rules, reminder projection and the customer store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{load_config, ConfigError, CrmConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{ActionRecord, ActionType, Customer, CustomerId, Product};
pub use model::reminder::{Reminder, Urgency};
pub use model::validation::ValidationError;
pub use repo::calendar_repo::{CalendarEntry, CalendarRepository, SqliteCalendarRepository};
pub use repo::customer_repo::{
    CustomerListQuery, CustomerRepository, SqliteCustomerRepository, StoreError, StoreResult,
};
pub use schedule::interval::{compute_next_due_date, IntervalDays, LocalDay, ScheduleDefaults};
pub use schedule::projector::{project_reminders, ReminderFilter, ReminderProjection};
pub use service::completion_service::{CompletionError, CompletionService};
pub use service::customer_service::{CustomerDraft, CustomerService, CustomerServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
