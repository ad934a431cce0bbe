//! FieldCRM command-line front end.
//!
//! # Responsibility
//! - Drive the core use cases against a local SQLite store.
//! - Keep output plain text so it can be piped or diffed.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use fieldcrm_core::config::{default_config_path, load_config};
use fieldcrm_core::model::customer::Product;
use fieldcrm_core::notify::{next_digest_time, send_daily_digest, LogNotifier};
use fieldcrm_core::schedule::interval::{parse_day, today_local};
use fieldcrm_core::service::calendar_service::CalendarService;
use fieldcrm_core::service::reminder_service::ReminderService;
use fieldcrm_core::service::report_service::ReportService;
use fieldcrm_core::{
    init_logging, open_db, ActionType, CrmConfig, CustomerDraft, CustomerService, IntervalDays,
    ReminderFilter, SqliteCalendarRepository, SqliteCustomerRepository,
};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fieldcrm")]
#[command(about = "Customer call/visit reminders on a local database")]
#[command(version)]
struct Args {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database path
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check core linkage
    Ping,
    /// Create a customer
    AddCustomer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        company: String,
        /// Days between calls (blank uses the configured default)
        #[arg(long, default_value = "")]
        call_interval: String,
        /// Days between visits (blank uses the configured default)
        #[arg(long, default_value = "")]
        visit_interval: String,
        /// Product name, repeatable
        #[arg(long = "product")]
        products: Vec<String>,
    },
    /// List reminders sorted by due date
    Reminders {
        /// Only `call` or `visit`
        #[arg(long = "type")]
        action: Option<String>,
        /// Customer name substring
        #[arg(long)]
        search: Option<String>,
    },
    /// Mark a call or visit as done
    Complete {
        customer_id: Uuid,
        action: String,
        /// Day performed (YYYY-MM-DD), defaults to today
        #[arg(long)]
        on: Option<String>,
    },
    /// Plan a call or visit on a date
    Schedule {
        customer_id: Uuid,
        date: String,
        action: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show planned entries day by day
    Calendar {
        /// First day (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Print the daily report and headline stats
    Report,
    /// Deliver today's digest and print when the next one is due
    Digest {
        /// Signed-in user the digest is addressed to
        #[arg(long)]
        user: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match args.config.clone().or_else(default_config_path) {
        Some(path) => load_config(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CrmConfig::default(),
    };

    if let Some(log_dir) = config.log_dir() {
        init_logging(config.log_level(), &log_dir.to_string_lossy())
            .map_err(anyhow::Error::msg)
            .context("Failed to initialize logging")?;
    }

    let db_path = args.db.clone().unwrap_or_else(|| config.db_path_or_default());
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    run(args.command, &config, &db_path)
}

fn run(command: Command, config: &CrmConfig, db_path: &Path) -> Result<()> {
    if let Command::Ping = command {
        println!("fieldcrm_core ping={}", fieldcrm_core::ping());
        println!("fieldcrm_core version={}", fieldcrm_core::core_version());
        return Ok(());
    }

    let conn = open_db(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let today = today_local();

    match command {
        Command::Ping => {}
        Command::AddCustomer {
            name,
            company,
            call_interval,
            visit_interval,
            products,
        } => {
            let defaults = config.schedule_defaults()?;
            let draft = CustomerDraft {
                name,
                company,
                call_interval: Some(IntervalDays::parse_or(&call_interval, defaults.call)?),
                visit_interval: Some(IntervalDays::parse_or(&visit_interval, defaults.visit)?),
                products: products
                    .into_iter()
                    .map(|name| Product::new(name, None))
                    .collect(),
                ..CustomerDraft::default()
            };
            let service =
                CustomerService::with_defaults(SqliteCustomerRepository::try_new(&conn)?, defaults);
            let customer = service.create_customer(&draft, today)?;
            println!("{}", customer.id);
        }
        Command::Reminders { action, search } => {
            let filter = ReminderFilter {
                search,
                action: action.as_deref().map(ActionType::parse).transpose()?,
            };
            let service = ReminderService::new(SqliteCustomerRepository::try_new(&conn)?);
            for reminder in service.due_reminders(&filter, today)? {
                println!(
                    "{:<12} {:<6} {:<13} {}  {}",
                    reminder.due_label(),
                    reminder.action,
                    reminder.urgency.as_str(),
                    reminder.customer_name,
                    reminder.customer_id
                );
            }
        }
        Command::Complete {
            customer_id,
            action,
            on,
        } => {
            let action = ActionType::parse(&action)?;
            let performed_at = on.as_deref().map(parse_day).transpose()?.unwrap_or(today);
            let service = ReminderService::new(SqliteCustomerRepository::try_new(&conn)?);
            let record = service.complete(customer_id, action, performed_at)?;
            println!(
                "{} recorded on {}; next due {}",
                record.action, record.last_date, record.next_date
            );
        }
        Command::Schedule {
            customer_id,
            date,
            action,
            notes,
        } => {
            let service = CalendarService::new(SqliteCalendarRepository::try_new(&conn)?);
            let entry = service.schedule_entry(
                customer_id,
                parse_day(&date)?,
                ActionType::parse(&action)?,
                notes,
            )?;
            println!("{}", entry.id);
        }
        Command::Calendar { start, days } => {
            let start = start.as_deref().map(parse_day).transpose()?.unwrap_or(today);
            let service = CalendarService::with_window(
                SqliteCalendarRepository::try_new(&conn)?,
                config.calendar_window_days(),
            );
            for day in service.window(start, days)? {
                if day.entries.is_empty() {
                    continue;
                }
                println!("{}", day.date);
                for entry in day.entries {
                    println!(
                        "  {:<6} {}{}",
                        entry.action,
                        entry.customer_name,
                        entry
                            .notes
                            .map(|notes| format!(" ({notes})"))
                            .unwrap_or_default()
                    );
                }
            }
        }
        Command::Report => {
            let service = ReportService::new(SqliteCustomerRepository::try_new(&conn)?);
            print!("{}", service.daily_report(today)?.render_text());
            let stats = service.stats()?;
            println!(
                "\nCustomers: {}  Called: {}  Visited: {}",
                stats.total_customers, stats.total_calls, stats.total_visits
            );
            for product in stats.top_products {
                println!("  {} x{}", product.name, product.count);
            }
        }
        Command::Digest { user } => {
            let service = ReminderService::new(SqliteCustomerRepository::try_new(&conn)?);
            let reminders = service.due_reminders(&ReminderFilter::default(), today)?;
            match send_daily_digest(&LogNotifier::new(user), &reminders) {
                Some(notification) => println!("{}: {}", notification.title, notification.body),
                None => println!("No signed-in user; digest not sent."),
            }
            let next = next_digest_time(Local::now().naive_local(), config.digest_hour())?;
            println!("Next digest at {}", next.format("%Y-%m-%d %H:%M"));
        }
    }

    Ok(())
}
