use chrono::NaiveDate;
use fieldcrm_core::db::open_db_in_memory;
use fieldcrm_core::model::customer::{ActionType, Product};
use fieldcrm_core::config::CrmConfig;
use fieldcrm_core::notify::{next_digest_time, send_daily_digest, LogNotifier};
use fieldcrm_core::repo::customer_repo::SqliteCustomerRepository;
use fieldcrm_core::schedule::projector::ReminderFilter;
use fieldcrm_core::service::customer_service::{CustomerDraft, CustomerService};
use fieldcrm_core::service::reminder_service::ReminderService;
use fieldcrm_core::service::report_service::ReportService;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn draft(name: &str, products: &[&str]) -> CustomerDraft {
    CustomerDraft {
        name: name.to_string(),
        company: "Acme".to_string(),
        products: products
            .iter()
            .map(|product| Product::new(*product, None))
            .collect(),
        ..CustomerDraft::default()
    }
}

#[test]
fn reports_reflect_completed_actions() {
    let conn = open_db_in_memory().unwrap();
    let customers = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    let ayla = customers
        .create_customer(&draft("Ayla", &["PP", "PVC"]), day(2024, 6, 1))
        .unwrap();
    customers
        .create_customer(&draft("Baran", &["PP"]), day(2024, 6, 1))
        .unwrap();

    let reminders = ReminderService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    reminders
        .complete(ayla.id, ActionType::Visit, day(2024, 6, 9))
        .unwrap();

    let reports = ReportService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    let stats = reports.stats().unwrap();
    assert_eq!(stats.total_customers, 2);
    assert_eq!(stats.total_calls, 0);
    assert_eq!(stats.total_visits, 1);
    assert_eq!(stats.top_products[0].name, "PP");
    assert_eq!(stats.top_products[0].count, 2);

    let report = reports.daily_report(day(2024, 6, 10)).unwrap();
    assert_eq!(report.yesterday_visits.len(), 1);
    assert_eq!(report.yesterday_visits[0].customer_id, ayla.id);
    assert_eq!(report.due_calls.len(), 2);
    assert!(report.due_visits.is_empty());

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["today"], "2024-06-10");
    assert_eq!(json["yesterday_visits"][0]["name"], "Ayla");
}

#[test]
fn digest_counts_due_reminders_from_the_store() {
    let conn = open_db_in_memory().unwrap();
    let customers = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    customers
        .create_customer(&draft("Ayla", &[]), day(2024, 6, 1))
        .unwrap();
    customers
        .create_customer(&draft("Baran", &[]), day(2024, 6, 9))
        .unwrap();

    let service = ReminderService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    let due = service
        .due_reminders(&ReminderFilter::default(), day(2024, 6, 10))
        .unwrap();

    let notifier = LogNotifier::new(Some("rep@example.com".to_string()));
    let sent = send_daily_digest(&notifier, &due).unwrap();
    assert_eq!(
        sent.body,
        "You have 1 calls and 0 visits scheduled for today."
    );
}

#[test]
fn reminders_serialize_with_type_field() {
    let conn = open_db_in_memory().unwrap();
    let customers = CustomerService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    customers
        .create_customer(&draft("Ayla", &[]), day(2024, 6, 3))
        .unwrap();

    let service = ReminderService::new(SqliteCustomerRepository::try_new(&conn).unwrap());
    let reminders = service
        .due_reminders(&ReminderFilter::default(), day(2024, 6, 10))
        .unwrap();
    let json = serde_json::to_value(&reminders).unwrap();

    assert_eq!(json[0]["type"], "call");
    assert_eq!(json[0]["due_date"], "2024-06-10");
    assert_eq!(json[1]["type"], "visit");
    assert_eq!(json[1]["last_date"], serde_json::Value::Null);
}

#[test]
fn configured_digest_hour_drives_the_next_delivery() {
    let config = CrmConfig::from_toml_str("[schedule]\ndigest_hour = 18\n").unwrap();
    let morning = day(2024, 6, 10).and_hms_opt(8, 0, 0).unwrap();
    let night = day(2024, 6, 10).and_hms_opt(20, 0, 0).unwrap();

    assert_eq!(
        next_digest_time(morning, config.digest_hour()).unwrap(),
        day(2024, 6, 10).and_hms_opt(18, 0, 0).unwrap()
    );
    assert_eq!(
        next_digest_time(night, config.digest_hour()).unwrap(),
        day(2024, 6, 11).and_hms_opt(18, 0, 0).unwrap()
    );
    assert_eq!(
        next_digest_time(morning, CrmConfig::default().digest_hour()).unwrap(),
        day(2024, 6, 10).and_hms_opt(9, 0, 0).unwrap()
    );
}
