//! Customer use-case service.
//!
//! # Responsibility
//! - Create customers with their initial call/visit schedule.
//! - Edit profiles while keeping next dates consistent with intervals.
//! - Search customers by text and due state.
//!
//! # Invariants
//! - New customers start with `next = today + interval` and no last dates.
//! - When an interval changes, `next` is recomputed from `last` (or today
//!   when the action was never performed).

use crate::model::customer::{ActionType, Customer, CustomerId, Product};
use crate::model::validation::ValidationError;
use crate::repo::customer_repo::{CustomerListQuery, CustomerRepository, StoreError};
use crate::schedule::interval::{compute_next_due_date, IntervalDays, ScheduleDefaults};
use chrono::NaiveDate;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for customer use-cases.
#[derive(Debug)]
pub enum CustomerServiceError {
    Validation(ValidationError),
    CustomerNotFound(CustomerId),
    Store(StoreError),
}

impl Display for CustomerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::CustomerNotFound(id) => write!(f, "customer not found: {id}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CustomerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::CustomerNotFound(_) => None,
        }
    }
}

impl From<ValidationError> for CustomerServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CustomerServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::CustomerNotFound(id),
            StoreError::Validation(err) => Self::Validation(err),
            other => Self::Store(other),
        }
    }
}

/// Editable customer fields, as entered in the customer form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerDraft {
    pub name: String,
    pub company: String,
    pub address: Option<String>,
    pub sector: Option<String>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
    /// On create `None` uses the configured default; on update it keeps the
    /// current interval.
    pub call_interval: Option<IntervalDays>,
    /// Same `None` rules as `call_interval`.
    pub visit_interval: Option<IntervalDays>,
    /// Rows with a blank name are dropped.
    pub products: Vec<Product>,
}

/// Customer list filter used by the customer page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    /// Case-insensitive substring of name, company or any product name.
    pub search: Option<String>,
    /// Only customers whose next date for this action is today or earlier.
    pub due: Option<ActionType>,
}

impl CustomerFilter {
    fn matches_search(&self, customer: &Customer) -> bool {
        let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase)
        else {
            return true;
        };

        customer.name.to_lowercase().contains(&term)
            || customer.company.to_lowercase().contains(&term)
            || customer
                .products
                .iter()
                .any(|product| product.name.to_lowercase().contains(&term))
    }
}

/// Customer service facade over repository implementations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
    defaults: ScheduleDefaults,
}

impl<R: CustomerRepository> CustomerService<R> {
    /// Creates a service with built-in interval defaults (7/30 days).
    pub fn new(repo: R) -> Self {
        Self::with_defaults(repo, ScheduleDefaults::default())
    }

    pub fn with_defaults(repo: R, defaults: ScheduleDefaults) -> Self {
        Self { repo, defaults }
    }

    /// Creates a customer scheduled relative to `today`.
    pub fn create_customer(
        &self,
        draft: &CustomerDraft,
        today: NaiveDate,
    ) -> Result<Customer, CustomerServiceError> {
        let mut customer = Customer::new(
            draft.name.trim(),
            draft.company.trim(),
            draft.call_interval.unwrap_or(self.defaults.call),
            draft.visit_interval.unwrap_or(self.defaults.visit),
        );
        apply_profile(&mut customer, draft);
        customer.validate()?;
        customer.seed_schedule(today)?;

        self.repo.create_customer(&customer)?;
        info!(
            "event=customer_create module=service status=ok call_interval_days={} visit_interval_days={}",
            customer.call_interval.days(),
            customer.visit_interval.days()
        );
        Ok(customer)
    }

    /// Replaces profile fields, intervals and products of an existing customer.
    ///
    /// Last dates are preserved; next dates move only for actions whose
    /// interval changed.
    pub fn update_profile(
        &self,
        id: CustomerId,
        draft: &CustomerDraft,
        today: NaiveDate,
    ) -> Result<Customer, CustomerServiceError> {
        let mut customer = self.get_customer(id)?;
        customer.name = draft.name.trim().to_string();
        customer.company = draft.company.trim().to_string();
        apply_profile(&mut customer, draft);

        for action in ActionType::ALL {
            let Some(interval) = interval_from_draft(draft, action) else {
                continue;
            };
            if interval == customer.interval_for(action) {
                continue;
            }
            let base = customer.last_date(action).unwrap_or(today);
            let next = compute_next_due_date(base, interval)?;
            match action {
                ActionType::Call => {
                    customer.call_interval = interval;
                    customer.next_call_date = Some(next);
                }
                ActionType::Visit => {
                    customer.visit_interval = interval;
                    customer.next_visit_date = Some(next);
                }
            }
        }

        customer.validate()?;
        self.repo.update_customer(&customer)?;
        info!("event=customer_update module=service status=ok");
        Ok(customer)
    }

    pub fn get_customer(&self, id: CustomerId) -> Result<Customer, CustomerServiceError> {
        self.repo
            .get_customer(id)?
            .ok_or(CustomerServiceError::CustomerNotFound(id))
    }

    /// Lists customers matching `filter`, ordered by name.
    pub fn search_customers(
        &self,
        filter: &CustomerFilter,
        today: NaiveDate,
    ) -> Result<Vec<Customer>, CustomerServiceError> {
        let query = CustomerListQuery {
            due_by: filter.due.map(|action| (action, today)),
            ..CustomerListQuery::default()
        };
        let customers = self.repo.list_customers(&query)?;
        Ok(customers
            .into_iter()
            .filter(|customer| filter.matches_search(customer))
            .collect())
    }

    pub fn delete_customer(&self, id: CustomerId) -> Result<(), CustomerServiceError> {
        self.repo.delete_customer(id)?;
        info!("event=customer_delete module=service status=ok");
        Ok(())
    }
}

fn interval_from_draft(draft: &CustomerDraft, action: ActionType) -> Option<IntervalDays> {
    match action {
        ActionType::Call => draft.call_interval,
        ActionType::Visit => draft.visit_interval,
    }
}

fn apply_profile(customer: &mut Customer, draft: &CustomerDraft) {
    customer.address = normalize_optional(draft.address.as_deref());
    customer.sector = normalize_optional(draft.sector.as_deref());
    customer.contact_person = normalize_optional(draft.contact_person.as_deref());
    customer.notes = normalize_optional(draft.notes.as_deref());
    customer.products = draft
        .products
        .iter()
        .filter(|product| !product.name.trim().is_empty())
        .map(|product| Product::new(product.name.trim(), product.average_tonnage))
        .collect();
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{normalize_optional, CustomerFilter};
    use crate::model::customer::{Customer, Product};
    use crate::schedule::interval::IntervalDays;

    #[test]
    fn normalize_optional_drops_blank_values() {
        assert_eq!(normalize_optional(Some("  ")), None);
        assert_eq!(normalize_optional(Some(" Izmir ")).as_deref(), Some("Izmir"));
        assert_eq!(normalize_optional(None), None);
    }

    #[test]
    fn search_matches_product_names() {
        let mut customer = Customer::new(
            "Ayla",
            "Akdeniz Plastik",
            IntervalDays::from_days(7),
            IntervalDays::from_days(30),
        );
        customer.products.push(Product::new("HDPE Film", Some(12.5)));

        let by_product = CustomerFilter {
            search: Some("hdpe".to_string()),
            due: None,
        };
        let miss = CustomerFilter {
            search: Some("pvc".to_string()),
            due: None,
        };
        assert!(by_product.matches_search(&customer));
        assert!(!miss.matches_search(&customer));
        assert!(CustomerFilter::default().matches_search(&customer));
    }
}
