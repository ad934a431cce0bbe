//! Customer domain model.
//!
//! # Responsibility
//! - Define the customer record read and written by the reminder core.
//! - Keep call/visit field selection in one place (`ActionType`).
//!
//! # Invariants
//! - `id` is stable and never reused for another customer.
//! - After a completion, `next_X_date == last_X_date + X_interval`.
//! - `name` and `company` are never blank in persisted rows.

use crate::model::validation::ValidationError;
use crate::schedule::interval::{compute_next_due_date, IntervalDays};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier of a customer record.
pub type CustomerId = Uuid;

/// Recurring action performed for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Phone call.
    Call,
    /// On-site visit.
    Visit,
}

impl ActionType {
    /// Both action types in projection order.
    pub const ALL: [ActionType; 2] = [ActionType::Call, ActionType::Visit];

    /// Stable lowercase label used in storage and user input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Visit => "visit",
        }
    }

    /// Parses a user-facing label (`call` / `visit`, case-insensitive).
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(Self::Call),
            "visit" => Ok(Self::Visit),
            _ => Err(ValidationError::UnknownAction(value.trim().to_string())),
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Product bought by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    /// Average monthly tonnage; `None` when unknown.
    pub average_tonnage: Option<f64>,
}

impl Product {
    pub fn new(name: impl Into<String>, average_tonnage: Option<f64>) -> Self {
        Self {
            name: name.into(),
            average_tonnage,
        }
    }
}

/// Last/next date pair written by one completed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub action: ActionType,
    pub last_date: NaiveDate,
    pub next_date: NaiveDate,
}

/// Canonical customer record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub company: String,
    pub address: Option<String>,
    pub sector: Option<String>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
    pub call_interval: IntervalDays,
    pub visit_interval: IntervalDays,
    pub last_call_date: Option<NaiveDate>,
    pub last_visit_date: Option<NaiveDate>,
    pub next_call_date: Option<NaiveDate>,
    pub next_visit_date: Option<NaiveDate>,
    pub products: Vec<Product>,
}

impl Customer {
    /// Creates an unscheduled customer with a generated stable ID.
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        call_interval: IntervalDays,
        visit_interval: IntervalDays,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), name, company, call_interval, visit_interval)
    }

    /// Creates an unscheduled customer with a caller-provided ID.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: CustomerId,
        name: impl Into<String>,
        company: impl Into<String>,
        call_interval: IntervalDays,
        visit_interval: IntervalDays,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            company: company.into(),
            address: None,
            sector: None,
            contact_person: None,
            notes: None,
            call_interval,
            visit_interval,
            last_call_date: None,
            last_visit_date: None,
            next_call_date: None,
            next_visit_date: None,
            products: Vec::new(),
        }
    }

    pub fn interval_for(&self, action: ActionType) -> IntervalDays {
        match action {
            ActionType::Call => self.call_interval,
            ActionType::Visit => self.visit_interval,
        }
    }

    pub fn last_date(&self, action: ActionType) -> Option<NaiveDate> {
        match action {
            ActionType::Call => self.last_call_date,
            ActionType::Visit => self.last_visit_date,
        }
    }

    pub fn next_date(&self, action: ActionType) -> Option<NaiveDate> {
        match action {
            ActionType::Call => self.next_call_date,
            ActionType::Visit => self.next_visit_date,
        }
    }

    /// Sets the default schedule of a new customer: `today + interval` for
    /// both actions, no last dates.
    pub fn seed_schedule(&mut self, today: NaiveDate) -> Result<(), ValidationError> {
        self.last_call_date = None;
        self.last_visit_date = None;
        self.next_call_date = Some(compute_next_due_date(today, self.call_interval)?);
        self.next_visit_date = Some(compute_next_due_date(today, self.visit_interval)?);
        Ok(())
    }

    /// Applies a persisted completion to this in-memory copy.
    ///
    /// Only the two fields of `record.action` change.
    pub fn apply_action(&mut self, record: &ActionRecord) {
        match record.action {
            ActionType::Call => {
                self.last_call_date = Some(record.last_date);
                self.next_call_date = Some(record.next_date);
            }
            ActionType::Visit => {
                self.last_visit_date = Some(record.last_date);
                self.next_visit_date = Some(record.next_date);
            }
        }
    }

    /// Validates profile fields before persistence.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::BlankField("name"));
        }
        if self.company.trim().is_empty() {
            return Err(ValidationError::BlankField("company"));
        }
        for product in &self.products {
            if product.name.trim().is_empty() {
                return Err(ValidationError::BlankField("product name"));
            }
            if let Some(tonnage) = product.average_tonnage {
                if !tonnage.is_finite() || tonnage < 0.0 {
                    return Err(ValidationError::InvalidTonnage(tonnage));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionRecord, ActionType, Customer, Product};
    use crate::model::validation::ValidationError;
    use crate::schedule::interval::IntervalDays;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Customer {
        Customer::new(
            "Ayla",
            "Akdeniz Plastik",
            IntervalDays::new(7).unwrap(),
            IntervalDays::new(30).unwrap(),
        )
    }

    #[test]
    fn action_type_parses_case_insensitive_labels() {
        assert_eq!(ActionType::parse(" CALL ").unwrap(), ActionType::Call);
        assert_eq!("visit".parse::<ActionType>().unwrap(), ActionType::Visit);
        assert_eq!(
            ActionType::parse("meeting").unwrap_err(),
            ValidationError::UnknownAction("meeting".to_string())
        );
    }

    #[test]
    fn seed_schedule_uses_intervals_from_today() {
        let mut customer = sample();
        customer.seed_schedule(day(2024, 6, 10)).unwrap();
        assert_eq!(customer.next_call_date, Some(day(2024, 6, 17)));
        assert_eq!(customer.next_visit_date, Some(day(2024, 7, 10)));
        assert_eq!(customer.last_call_date, None);
        assert_eq!(customer.last_visit_date, None);
    }

    #[test]
    fn apply_action_touches_only_one_pair() {
        let mut customer = sample();
        customer.seed_schedule(day(2024, 6, 1)).unwrap();
        let visit_before = (customer.last_visit_date, customer.next_visit_date);

        customer.apply_action(&ActionRecord {
            action: ActionType::Call,
            last_date: day(2024, 6, 10),
            next_date: day(2024, 6, 17),
        });

        assert_eq!(customer.last_call_date, Some(day(2024, 6, 10)));
        assert_eq!(customer.next_call_date, Some(day(2024, 6, 17)));
        assert_eq!(
            (customer.last_visit_date, customer.next_visit_date),
            visit_before
        );
    }

    #[test]
    fn validate_rejects_blank_company_and_negative_tonnage() {
        let mut customer = sample();
        customer.company = "   ".to_string();
        assert_eq!(
            customer.validate().unwrap_err(),
            ValidationError::BlankField("company")
        );

        let mut customer = sample();
        customer.products.push(Product::new("PP granule", Some(-1.0)));
        assert!(matches!(
            customer.validate().unwrap_err(),
            ValidationError::InvalidTonnage(_)
        ));
    }
}
