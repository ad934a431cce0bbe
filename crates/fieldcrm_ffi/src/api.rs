//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose reminder, customer, calendar and report use cases to Dart via FRB.
//! - Flatten core types into string-based envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Dates cross the boundary as `YYYY-MM-DD` strings.
//! - Interval defaults and calendar window follow the same TOML config as the
//!   CLI (`FIELDCRM_CONFIG_PATH`, else the platform config path).
//! - Failures are reported in envelopes, never as panics.

use fieldcrm_core::config::default_config_path;
use fieldcrm_core::schedule::interval::{parse_day, today_local};
use fieldcrm_core::service::calendar_service::CalendarService;
use fieldcrm_core::service::reminder_service::ReminderService;
use fieldcrm_core::service::report_service::ReportService;
use fieldcrm_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, load_config, open_db,
    ping as ping_inner, ActionType, CompletionService, CrmConfig, CustomerDraft, CustomerService,
    IntervalDays, Reminder, ReminderFilter, SqliteCalendarRepository, SqliteCustomerRepository,
};
use log::warn;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use uuid::Uuid;

const CRM_DB_FILE_NAME: &str = "fieldcrm.sqlite3";
const CRM_CONFIG_ENV: &str = "FIELDCRM_CONFIG_PATH";
static CRM_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Reminder row for the reminders page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderItem {
    pub key: String,
    pub customer_id: String,
    pub customer_name: String,
    /// `call|visit`.
    pub action: String,
    /// ISO date or `not scheduled`.
    pub due_label: String,
    pub last_date: Option<String>,
    /// `overdue|due_today|upcoming|unscheduled`.
    pub urgency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemindersResponse {
    pub items: Vec<ReminderItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrmActionResponse {
    pub ok: bool,
    /// Affected record ID, when there is one.
    pub id: Option<String>,
    pub message: String,
}

impl CrmActionResponse {
    fn success(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEntryItem {
    pub entry_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub action: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDayItem {
    pub date: String,
    pub entries: Vec<CalendarEntryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarWindowResponse {
    pub days: Vec<CalendarDayItem>,
    pub message: String,
}

/// Lists reminders for today, optionally filtered by name and action.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Unknown `action` labels produce an empty list with an error message.
#[flutter_rust_bridge::frb(sync)]
pub fn reminders_list(search: Option<String>, action: Option<String>) -> RemindersResponse {
    let result = parse_optional_action(action.as_deref()).and_then(|action| {
        let filter = ReminderFilter { search, action };
        with_connection(|conn| {
            let repo = SqliteCustomerRepository::try_new(conn).map_err(|err| err.to_string())?;
            ReminderService::new(repo)
                .due_reminders(&filter, today_local())
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(reminders) => {
            let items = reminders.iter().map(to_reminder_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No reminders.".to_string()
            } else {
                format!("Found {} reminder(s).", items.len())
            };
            RemindersResponse { items, message }
        }
        Err(err) => RemindersResponse {
            items: Vec::new(),
            message: format!("reminders_list failed: {err}"),
        },
    }
}

/// Marks a reminder as done today.
///
/// # FFI contract
/// - On success `message` carries the new next date.
/// - On failure the stored dates are unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn reminder_complete(customer_id: String, action: String) -> CrmActionResponse {
    let result = parse_customer_id(&customer_id).and_then(|id| {
        let action = ActionType::parse(&action).map_err(|err| err.to_string())?;
        with_connection(|conn| {
            let repo = SqliteCustomerRepository::try_new(conn).map_err(|err| err.to_string())?;
            CompletionService::new(repo)
                .complete_today(id, action)
                .map_err(|err| err.to_string())
        })
        .map(|record| (id, record))
    });

    match result {
        Ok((id, record)) => CrmActionResponse::success(
            format!("{} done. Next due {}.", record.action, record.next_date),
            id.to_string(),
        ),
        Err(err) => {
            warn!("event=ffi_reminder_complete module=ffi status=error error={err}");
            CrmActionResponse::failure(format!("reminder_complete failed: {err}"))
        }
    }
}

/// Creates a customer from the customer form.
///
/// Interval fields are raw form text: blank uses the configured default
/// (7/30 days without config), non-numeric or negative text is rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn customer_create(
    name: String,
    company: String,
    call_interval: String,
    visit_interval: String,
) -> CrmActionResponse {
    let defaults = match crm_config().and_then(|config| {
        config
            .schedule_defaults()
            .map_err(|err| format!("invalid config: {err}"))
    }) {
        Ok(defaults) => defaults,
        Err(err) => return CrmActionResponse::failure(format!("customer_create failed: {err}")),
    };
    let draft = IntervalDays::parse_or(&call_interval, defaults.call).and_then(|call| {
        IntervalDays::parse_or(&visit_interval, defaults.visit).map(|visit| CustomerDraft {
            name,
            company,
            call_interval: Some(call),
            visit_interval: Some(visit),
            ..CustomerDraft::default()
        })
    });
    let draft = match draft {
        Ok(draft) => draft,
        Err(err) => return CrmActionResponse::failure(format!("customer_create failed: {err}")),
    };

    let result = with_connection(|conn| {
        let repo = SqliteCustomerRepository::try_new(conn).map_err(|err| err.to_string())?;
        CustomerService::with_defaults(repo, defaults)
            .create_customer(&draft, today_local())
            .map_err(|err| err.to_string())
    });

    match result {
        Ok(customer) => CrmActionResponse::success("Customer created.", customer.id.to_string()),
        Err(err) => CrmActionResponse::failure(format!("customer_create failed: {err}")),
    }
}

/// Plans a call/visit on `date` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_schedule(
    customer_id: String,
    date: String,
    action: String,
    notes: Option<String>,
) -> CrmActionResponse {
    let result = parse_customer_id(&customer_id).and_then(|id| {
        let date = parse_day(&date).map_err(|err| err.to_string())?;
        let action = ActionType::parse(&action).map_err(|err| err.to_string())?;
        with_connection(|conn| {
            let repo = SqliteCalendarRepository::try_new(conn).map_err(|err| err.to_string())?;
            CalendarService::new(repo)
                .schedule_entry(id, date, action, notes)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(entry) => CrmActionResponse::success("Entry scheduled.", entry.id.to_string()),
        Err(err) => CrmActionResponse::failure(format!("calendar_schedule failed: {err}")),
    }
}

/// Day-by-day calendar starting at `start` (default today).
///
/// `days` is clamped to `1..=90`; `None` or `0` yields the configured
/// window (30 days without config).
#[flutter_rust_bridge::frb(sync)]
pub fn calendar_window(start: Option<String>, days: Option<u32>) -> CalendarWindowResponse {
    let start = match start.as_deref().map(parse_day).transpose() {
        Ok(start) => start.unwrap_or_else(today_local),
        Err(err) => {
            return CalendarWindowResponse {
                days: Vec::new(),
                message: format!("calendar_window failed: {err}"),
            }
        }
    };

    let result = crm_config().and_then(|config| {
        with_connection(|conn| {
            let repo = SqliteCalendarRepository::try_new(conn).map_err(|err| err.to_string())?;
            CalendarService::with_window(repo, config.calendar_window_days())
                .window(start, days)
                .map_err(|err| err.to_string())
        })
    });

    match result {
        Ok(window) => {
            let days = window
                .into_iter()
                .map(|day| CalendarDayItem {
                    date: day.date.to_string(),
                    entries: day
                        .entries
                        .into_iter()
                        .map(|entry| CalendarEntryItem {
                            entry_id: entry.id.to_string(),
                            customer_id: entry.customer_id.to_string(),
                            customer_name: entry.customer_name,
                            action: entry.action.to_string(),
                            notes: entry.notes,
                        })
                        .collect(),
                })
                .collect::<Vec<_>>();
            CalendarWindowResponse {
                message: format!("{} day(s).", days.len()),
                days,
            }
        }
        Err(err) => CalendarWindowResponse {
            days: Vec::new(),
            message: format!("calendar_window failed: {err}"),
        },
    }
}

/// Plain-text daily report for today, or an error message.
#[flutter_rust_bridge::frb(sync)]
pub fn report_daily() -> String {
    let result = with_connection(|conn| {
        let repo = SqliteCustomerRepository::try_new(conn).map_err(|err| err.to_string())?;
        ReportService::new(repo)
            .daily_report(today_local())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(report) => report.render_text(),
        Err(err) => format!("report_daily failed: {err}"),
    }
}

fn parse_optional_action(action: Option<&str>) -> Result<Option<ActionType>, String> {
    match action.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => ActionType::parse(value)
            .map(Some)
            .map_err(|err| err.to_string()),
        None => Ok(None),
    }
}

fn parse_customer_id(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|err| format!("invalid customer id `{raw}`: {err}"))
}

fn resolve_crm_db_path() -> PathBuf {
    CRM_DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("FIELDCRM_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(CRM_DB_FILE_NAME)
        })
        .clone()
}

fn resolve_crm_config_path() -> Option<PathBuf> {
    std::env::var(CRM_CONFIG_ENV)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(default_config_path)
}

fn load_crm_config(path: Option<&Path>) -> Result<CrmConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|err| format!("config load failed: {err}")),
        None => Ok(CrmConfig::default()),
    }
}

fn crm_config() -> Result<CrmConfig, String> {
    load_crm_config(resolve_crm_config_path().as_deref())
}

fn with_connection<T>(f: impl FnOnce(&Connection) -> Result<T, String>) -> Result<T, String> {
    let db_path = resolve_crm_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("CRM DB open failed: {err}"))?;
    f(&conn)
}

fn to_reminder_item(reminder: &Reminder) -> ReminderItem {
    ReminderItem {
        key: reminder.key(),
        customer_id: reminder.customer_id.to_string(),
        customer_name: reminder.customer_name.clone(),
        action: reminder.action.to_string(),
        due_label: reminder.due_label(),
        last_date: reminder.last_date.map(|date| date.to_string()),
        urgency: reminder.urgency.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        calendar_schedule, calendar_window, core_version, customer_create, init_logging,
        load_crm_config, ping, reminder_complete, reminders_list, report_daily,
    };
    use chrono::Days;
    use fieldcrm_core::open_db;
    use fieldcrm_core::schedule::interval::today_local;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn customer_create_rejects_bad_interval_text() {
        let response = customer_create(
            "Ayla".to_string(),
            "Acme".to_string(),
            "-3".to_string(),
            String::new(),
        );
        assert!(!response.ok);
        assert!(response.message.contains("negative"), "{}", response.message);

        let response = customer_create(
            "Ayla".to_string(),
            "Acme".to_string(),
            "weekly".to_string(),
            String::new(),
        );
        assert!(!response.ok);
    }

    #[test]
    fn created_customer_appears_in_reminders_and_completes() {
        let name = unique_token("ffi-reminder");
        let created = customer_create(
            name.clone(),
            "Acme".to_string(),
            String::new(),
            "14".to_string(),
        );
        assert!(created.ok, "{}", created.message);
        let customer_id = created.id.clone().unwrap();

        let listed = reminders_list(Some(name.clone()), Some("visit".to_string()));
        assert_eq!(listed.items.len(), 1, "{}", listed.message);
        assert_eq!(listed.items[0].action, "visit");
        assert_eq!(listed.items[0].urgency, "upcoming");

        let done = reminder_complete(customer_id.clone(), "call".to_string());
        assert!(done.ok, "{}", done.message);

        let today = today_local();
        let expected_next = today.checked_add_days(Days::new(7)).unwrap();
        let conn = open_db(super::resolve_crm_db_path()).unwrap();
        let (last_call, next_call): (String, String) = conn
            .query_row(
                "SELECT last_call_date, next_call_date FROM customers WHERE id = ?1",
                [customer_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(last_call, today.to_string());
        assert_eq!(next_call, expected_next.to_string());
    }

    #[test]
    fn reminder_complete_rejects_unknown_action_and_id() {
        let response = reminder_complete(uuid::Uuid::new_v4().to_string(), "email".to_string());
        assert!(!response.ok);
        let response = reminder_complete("not-a-uuid".to_string(), "call".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("invalid customer id"));
    }

    #[test]
    fn calendar_window_groups_scheduled_entries() {
        let created = customer_create(
            unique_token("ffi-calendar"),
            "Acme".to_string(),
            String::new(),
            String::new(),
        );
        let customer_id = created.id.unwrap();
        let scheduled = calendar_schedule(
            customer_id.clone(),
            "2031-03-02".to_string(),
            "visit".to_string(),
            Some("bring samples".to_string()),
        );
        assert!(scheduled.ok, "{}", scheduled.message);

        let window = calendar_window(Some("2031-03-01".to_string()), Some(3));
        assert_eq!(window.days.len(), 3, "{}", window.message);
        assert_eq!(window.days[1].date, "2031-03-02");
        assert!(window.days[1]
            .entries
            .iter()
            .any(|entry| entry.customer_id == customer_id && entry.action == "visit"));

        let bad = calendar_window(Some("03/01/2031".to_string()), None);
        assert!(bad.days.is_empty());
    }

    #[test]
    fn config_file_supplies_interval_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[schedule]\ndefault_call_interval_days = 14\n\n[calendar]\nwindow_days = 10\n",
        )
        .unwrap();

        let config = load_crm_config(Some(&path)).unwrap();
        let defaults = config.schedule_defaults().unwrap();
        assert_eq!(defaults.call.days(), 14);
        assert_eq!(defaults.visit.days(), 30);
        assert_eq!(config.calendar_window_days(), 10);

        let missing = load_crm_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(missing.schedule_defaults().unwrap().call.days(), 7);
        assert_eq!(load_crm_config(None).unwrap().calendar_window_days(), 30);

        std::fs::write(&path, "[schedule]\ndefault_visit_interval_days = -1\n").unwrap();
        let err = load_crm_config(Some(&path)).unwrap_err();
        assert!(err.starts_with("config load failed"), "{err}");
    }

    #[test]
    fn report_daily_renders_text() {
        assert!(report_daily().starts_with("Daily customer report"));
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
