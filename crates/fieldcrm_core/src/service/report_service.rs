//! Summary reports over the customer base.
//!
//! # Responsibility
//! - Aggregate headline counts and product popularity.
//! - Build the daily activity digest (yesterday's work, today's due list).
//!
//! # Invariants
//! - Reports are computed from one customer listing and never written back.

use crate::model::customer::{ActionType, Customer, CustomerId};
use crate::repo::customer_repo::{CustomerListQuery, CustomerRepository, StoreResult};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;

const TOP_PRODUCTS_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCount {
    pub name: String,
    pub count: usize,
}

/// Headline numbers of the reports page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrmStats {
    pub total_customers: usize,
    /// Customers with at least one recorded call.
    pub total_calls: usize,
    /// Customers with at least one recorded visit.
    pub total_visits: usize,
    /// Most frequent product names, at most five.
    pub top_products: Vec<ProductCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub customer_id: CustomerId,
    pub name: String,
    pub company: String,
    pub date: NaiveDate,
}

/// Daily digest: what happened yesterday and what is due now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub today: NaiveDate,
    pub yesterday_calls: Vec<ReportLine>,
    pub yesterday_visits: Vec<ReportLine>,
    /// Calls whose next date is today or earlier.
    pub due_calls: Vec<ReportLine>,
    /// Visits whose next date is today or earlier.
    pub due_visits: Vec<ReportLine>,
}

/// Computes headline stats for `customers`.
pub fn stats(customers: &[Customer]) -> CrmStats {
    let mut product_counts: HashMap<&str, usize> = HashMap::new();
    for product in customers.iter().flat_map(|customer| &customer.products) {
        *product_counts.entry(product.name.as_str()).or_default() += 1;
    }

    let mut top_products = product_counts
        .into_iter()
        .map(|(name, count)| ProductCount {
            name: name.to_string(),
            count,
        })
        .collect::<Vec<_>>();
    top_products.sort_by(|left, right| {
        right
            .count
            .cmp(&left.count)
            .then_with(|| left.name.cmp(&right.name))
    });
    top_products.truncate(TOP_PRODUCTS_LIMIT);

    CrmStats {
        total_customers: customers.len(),
        total_calls: customers
            .iter()
            .filter(|customer| customer.last_call_date.is_some())
            .count(),
        total_visits: customers
            .iter()
            .filter(|customer| customer.last_visit_date.is_some())
            .count(),
        top_products,
    }
}

/// Builds the daily digest for `today`.
pub fn daily_report(customers: &[Customer], today: NaiveDate) -> DailyReport {
    let yesterday = today.checked_sub_days(Days::new(1));
    let performed_yesterday = |action: ActionType| {
        lines(customers, |customer| {
            customer
                .last_date(action)
                .filter(|date| Some(*date) == yesterday)
        })
    };
    let due_by_today = |action: ActionType| {
        lines(customers, |customer| {
            customer.next_date(action).filter(|date| *date <= today)
        })
    };

    DailyReport {
        today,
        yesterday_calls: performed_yesterday(ActionType::Call),
        yesterday_visits: performed_yesterday(ActionType::Visit),
        due_calls: due_by_today(ActionType::Call),
        due_visits: due_by_today(ActionType::Visit),
    }
}

fn lines(
    customers: &[Customer],
    pick: impl Fn(&Customer) -> Option<NaiveDate>,
) -> Vec<ReportLine> {
    customers
        .iter()
        .filter_map(|customer| {
            pick(customer).map(|date| ReportLine {
                customer_id: customer.id,
                name: customer.name.clone(),
                company: customer.company.clone(),
                date,
            })
        })
        .collect()
}

impl DailyReport {
    /// Plain-text rendering suitable for an e-mail body or terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Daily customer report ({})", self.today);
        render_section(
            &mut out,
            "Calls made yesterday",
            &self.yesterday_calls,
            "No calls were made yesterday.",
        );
        render_section(
            &mut out,
            "Visits made yesterday",
            &self.yesterday_visits,
            "No visits were made yesterday.",
        );
        render_section(
            &mut out,
            "Calls due today",
            &self.due_calls,
            "No customers need a call today.",
        );
        render_section(
            &mut out,
            "Visits due today",
            &self.due_visits,
            "No customers need a visit today.",
        );
        out
    }
}

fn render_section(out: &mut String, title: &str, lines: &[ReportLine], empty: &str) {
    let _ = writeln!(out, "\n{title}");
    if lines.is_empty() {
        let _ = writeln!(out, "  {empty}");
        return;
    }
    for line in lines {
        let _ = writeln!(out, "  {} - {} ({})", line.name, line.company, line.date);
    }
}

/// Report facade that reads customers from a repository.
pub struct ReportService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> ReportService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn stats(&self) -> StoreResult<CrmStats> {
        let customers = self.repo.list_customers(&CustomerListQuery::default())?;
        Ok(stats(&customers))
    }

    pub fn daily_report(&self, today: NaiveDate) -> StoreResult<DailyReport> {
        let customers = self.repo.list_customers(&CustomerListQuery::default())?;
        Ok(daily_report(&customers, today))
    }
}

#[cfg(test)]
mod tests {
    use super::{daily_report, stats};
    use crate::model::customer::{Customer, Product};
    use crate::schedule::interval::IntervalDays;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn customer(name: &str, products: &[&str]) -> Customer {
        let mut customer = Customer::new(
            name,
            "Acme",
            IntervalDays::from_days(7),
            IntervalDays::from_days(30),
        );
        customer.products = products
            .iter()
            .map(|name| Product::new(*name, None))
            .collect();
        customer
    }

    #[test]
    fn stats_counts_performed_actions_and_ranks_products() {
        let mut first = customer("Ayla", &["PP", "HDPE"]);
        first.last_call_date = Some(day(2024, 6, 1));
        let mut second = customer("Baran", &["PP", "PVC"]);
        second.last_visit_date = Some(day(2024, 6, 2));
        let third = customer("Cem", &["PP", "HDPE"]);

        let stats = stats(&[first, second, third]);
        assert_eq!(stats.total_customers, 3);
        assert_eq!(stats.total_calls, 1);
        assert_eq!(stats.total_visits, 1);
        let ranked = stats
            .top_products
            .iter()
            .map(|product| (product.name.as_str(), product.count))
            .collect::<Vec<_>>();
        assert_eq!(ranked, vec![("PP", 3), ("HDPE", 2), ("PVC", 1)]);
    }

    #[test]
    fn daily_report_splits_yesterday_and_due_lists() {
        let today = day(2024, 6, 10);
        let mut called = customer("Ayla", &[]);
        called.last_call_date = Some(day(2024, 6, 9));
        called.next_call_date = Some(day(2024, 6, 16));
        let mut overdue = customer("Baran", &[]);
        overdue.next_visit_date = Some(day(2024, 6, 8));
        let mut due_today = customer("Cem", &[]);
        due_today.next_call_date = Some(today);

        let report = daily_report(&[called, overdue, due_today], today);
        assert_eq!(report.yesterday_calls.len(), 1);
        assert_eq!(report.yesterday_calls[0].name, "Ayla");
        assert!(report.yesterday_visits.is_empty());
        assert_eq!(report.due_calls.len(), 1);
        assert_eq!(report.due_calls[0].name, "Cem");
        assert_eq!(report.due_visits.len(), 1);
        assert_eq!(report.due_visits[0].name, "Baran");

        let text = report.render_text();
        assert!(text.contains("Daily customer report (2024-06-10)"));
        assert!(text.contains("No visits were made yesterday."));
    }
}
