//! Completion writer.
//!
//! # Responsibility
//! - Turn "call/visit performed" into a new last/next date pair.
//! - Persist that pair through the customer repository in one write.
//!
//! # Invariants
//! - `last = performed day`, `next = last + interval(action)`.
//! - Only the acted-upon action's two fields are written.
//! - A failed write is returned unchanged; nothing is retried and the
//!   caller's customer value is never mutated here.

use crate::model::customer::{ActionRecord, ActionType, Customer, CustomerId};
use crate::model::validation::ValidationError;
use crate::repo::customer_repo::{CustomerRepository, StoreError};
use crate::schedule::interval::{compute_next_due_date, today_local, LocalDay};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of a completion attempt. The action did not take effect.
#[derive(Debug)]
pub enum CompletionError {
    Validation(ValidationError),
    Store(StoreError),
}

impl Display for CompletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CompletionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<ValidationError> for CompletionError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for CompletionError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Computes the dates a completion would write, without persisting.
pub fn plan_completion(
    customer: &Customer,
    action: ActionType,
    performed_at: impl LocalDay,
) -> Result<ActionRecord, ValidationError> {
    let last_date = performed_at.local_day();
    let next_date = compute_next_due_date(last_date, customer.interval_for(action))?;
    Ok(ActionRecord {
        action,
        last_date,
        next_date,
    })
}

/// Use-case service for completing calls and visits.
pub struct CompletionService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CompletionService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Records that `action` was performed for `customer` at `performed_at`.
    ///
    /// # Contract
    /// - `performed_at` is normalized to its local day.
    /// - Returns the persisted dates; apply them with
    ///   `Customer::apply_action` to refresh an in-memory copy.
    pub fn complete_action(
        &self,
        customer: &Customer,
        action: ActionType,
        performed_at: impl LocalDay,
    ) -> Result<ActionRecord, CompletionError> {
        let record = plan_completion(customer, action, performed_at).map_err(|err| {
            warn!(
                "event=action_complete module=service status=error action={action} error_code=validation error={err}"
            );
            err
        })?;

        if let Err(err) = self.repo.record_action(customer.id, &record) {
            error!(
                "event=action_complete module=service status=error action={action} error_code=store_write_failed error={err}"
            );
            return Err(err.into());
        }

        info!(
            "event=action_complete module=service status=ok action={action} interval_days={}",
            customer.interval_for(action).days()
        );
        Ok(record)
    }

    /// Same as [`Self::complete_action`] with a textual action label.
    pub fn complete_action_by_label(
        &self,
        customer: &Customer,
        action: &str,
        performed_at: impl LocalDay,
    ) -> Result<ActionRecord, CompletionError> {
        let action = ActionType::parse(action)?;
        self.complete_action(customer, action, performed_at)
    }

    /// Loads the customer by ID and completes `action` at `performed_at`.
    pub fn complete_by_id(
        &self,
        id: CustomerId,
        action: ActionType,
        performed_at: impl LocalDay,
    ) -> Result<ActionRecord, CompletionError> {
        let customer = self
            .repo
            .get_customer(id)?
            .ok_or(StoreError::NotFound(id))?;
        self.complete_action(&customer, action, performed_at)
    }

    /// Completes `action` as of the current local day.
    pub fn complete_today(
        &self,
        id: CustomerId,
        action: ActionType,
    ) -> Result<ActionRecord, CompletionError> {
        self.complete_by_id(id, action, today_local())
    }
}

#[cfg(test)]
mod tests {
    use super::{plan_completion, CompletionError, CompletionService};
    use crate::model::customer::{ActionRecord, ActionType, Customer, CustomerId};
    use crate::model::validation::ValidationError;
    use crate::repo::customer_repo::{
        CustomerListQuery, CustomerRepository, StoreError, StoreResult,
    };
    use crate::schedule::interval::IntervalDays;
    use chrono::NaiveDate;
    use std::cell::RefCell;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// In-memory store that can be told to reject writes.
    struct FakeStore {
        customer: RefCell<Customer>,
        reject_writes: bool,
    }

    impl CustomerRepository for &FakeStore {
        fn create_customer(&self, customer: &Customer) -> StoreResult<CustomerId> {
            Ok(customer.id)
        }

        fn update_customer(&self, _customer: &Customer) -> StoreResult<()> {
            Ok(())
        }

        fn record_action(&self, id: CustomerId, record: &ActionRecord) -> StoreResult<()> {
            if self.reject_writes {
                return Err(StoreError::InvalidData("write rejected".to_string()));
            }
            if id != self.customer.borrow().id {
                return Err(StoreError::NotFound(id));
            }
            self.customer.borrow_mut().apply_action(record);
            Ok(())
        }

        fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
            let customer = self.customer.borrow();
            Ok((customer.id == id).then(|| customer.clone()))
        }

        fn list_customers(&self, _query: &CustomerListQuery) -> StoreResult<Vec<Customer>> {
            Ok(vec![self.customer.borrow().clone()])
        }

        fn delete_customer(&self, _id: CustomerId) -> StoreResult<()> {
            Ok(())
        }
    }

    fn weekly_customer() -> Customer {
        let mut customer = Customer::new(
            "Ayla",
            "Akdeniz Plastik",
            IntervalDays::from_days(7),
            IntervalDays::from_days(30),
        );
        customer.last_visit_date = Some(day(2024, 5, 1));
        customer.next_visit_date = Some(day(2024, 5, 31));
        customer
    }

    #[test]
    fn plan_normalizes_time_of_day() {
        let customer = weekly_customer();
        let performed_at = day(2024, 6, 10).and_hms_opt(16, 45, 0).unwrap();
        let record = plan_completion(&customer, ActionType::Call, performed_at).unwrap();
        assert_eq!(record.last_date, day(2024, 6, 10));
        assert_eq!(record.next_date, day(2024, 6, 17));
    }

    #[test]
    fn completing_a_call_leaves_visit_fields_alone() {
        let store = FakeStore {
            customer: RefCell::new(weekly_customer()),
            reject_writes: false,
        };
        let customer = store.customer.borrow().clone();
        let service = CompletionService::new(&store);

        let record = service
            .complete_action(&customer, ActionType::Call, day(2024, 6, 10))
            .unwrap();
        assert_eq!(record.next_date, day(2024, 6, 17));

        let stored = store.customer.borrow();
        assert_eq!(stored.last_call_date, Some(day(2024, 6, 10)));
        assert_eq!(stored.next_call_date, Some(day(2024, 6, 17)));
        assert_eq!(stored.last_visit_date, Some(day(2024, 5, 1)));
        assert_eq!(stored.next_visit_date, Some(day(2024, 5, 31)));
    }

    #[test]
    fn rejected_write_is_reported_and_changes_nothing() {
        let store = FakeStore {
            customer: RefCell::new(weekly_customer()),
            reject_writes: true,
        };
        let customer = store.customer.borrow().clone();
        let before = customer.clone();
        let service = CompletionService::new(&store);

        let err = service
            .complete_action(&customer, ActionType::Visit, day(2024, 6, 10))
            .unwrap_err();
        assert!(matches!(err, CompletionError::Store(StoreError::InvalidData(_))));
        assert_eq!(customer, before);
        assert_eq!(*store.customer.borrow(), before);
    }

    #[test]
    fn unknown_label_is_a_validation_error() {
        let store = FakeStore {
            customer: RefCell::new(weekly_customer()),
            reject_writes: false,
        };
        let customer = store.customer.borrow().clone();
        let service = CompletionService::new(&store);

        let err = service
            .complete_action_by_label(&customer, "email", day(2024, 6, 10))
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Validation(ValidationError::UnknownAction(_))
        ));
    }

    #[test]
    fn complete_by_unknown_id_is_not_found() {
        let store = FakeStore {
            customer: RefCell::new(weekly_customer()),
            reject_writes: false,
        };
        let service = CompletionService::new(&store);
        let missing = uuid::Uuid::new_v4();

        let err = service
            .complete_by_id(missing, ActionType::Call, day(2024, 6, 10))
            .unwrap_err();
        assert!(matches!(err, CompletionError::Store(StoreError::NotFound(id)) if id == missing));
    }
}
