//! Customer repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide select/insert/update/delete over the `customers` table.
//! - Provide the scoped two-column write used by action completion.
//! - Keep SQL details inside the store boundary.
//!
//! # Invariants
//! - Write paths call `Customer::validate()` before SQL mutations.
//! - `record_action` touches exactly the last/next columns of one action.
//! - Read paths reject malformed persisted rows instead of masking them.

use crate::db::DbError;
use crate::model::customer::{ActionRecord, ActionType, Customer, CustomerId, Product};
use crate::model::validation::ValidationError;
use crate::schedule::interval::IntervalDays;
use chrono::NaiveDate;
use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const CUSTOMER_SELECT_SQL: &str = "SELECT
    id,
    name,
    company,
    address,
    sector,
    contact_person,
    notes,
    call_interval_days,
    visit_interval_days,
    last_call_date,
    last_visit_date,
    next_call_date,
    next_visit_date
FROM customers";

const RECORD_CALL_SQL: &str = "UPDATE customers
 SET
    last_call_date = ?2,
    next_call_date = ?3,
    updated_at = (strftime('%s', 'now') * 1000)
 WHERE id = ?1;";

const RECORD_VISIT_SQL: &str = "UPDATE customers
 SET
    last_visit_date = ?2,
    next_visit_date = ?3,
    updated_at = (strftime('%s', 'now') * 1000)
 WHERE id = ?1;";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub type StoreResult<T> = Result<T, StoreError>;

/// Record store failure for customer and calendar operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(ValidationError),
    Db(DbError),
    NotFound(Uuid),
    InvalidData(String),
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is missing required table `{table}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing customers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerListQuery {
    /// Only customers whose next date for the action is on or before the day.
    pub due_by: Option<(ActionType, NaiveDate)>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for customer records.
pub trait CustomerRepository {
    fn create_customer(&self, customer: &Customer) -> StoreResult<CustomerId>;
    /// Replaces profile, intervals, dates and the product list.
    fn update_customer(&self, customer: &Customer) -> StoreResult<()>;
    /// Persists one completed action: writes exactly `last_X_date` and
    /// `next_X_date` for `record.action`.
    fn record_action(&self, id: CustomerId, record: &ActionRecord) -> StoreResult<()>;
    fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>>;
    /// Lists customers ordered by name.
    fn list_customers(&self, query: &CustomerListQuery) -> StoreResult<Vec<Customer>>;
    /// Hard-deletes a customer with its products and calendar entries.
    fn delete_customer(&self, id: CustomerId) -> StoreResult<()>;
}

/// SQLite-backed customer repository.
pub struct SqliteCustomerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCustomerRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for table in ["customers", "products"] {
            ensure_table_exists(conn, table)?;
        }
        Ok(Self { conn })
    }
}

impl CustomerRepository for SqliteCustomerRepository<'_> {
    fn create_customer(&self, customer: &Customer) -> StoreResult<CustomerId> {
        customer.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO customers (
                id,
                name,
                company,
                address,
                sector,
                contact_person,
                notes,
                call_interval_days,
                visit_interval_days,
                last_call_date,
                last_visit_date,
                next_call_date,
                next_visit_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
            params![
                customer.id.to_string(),
                customer.name.trim(),
                customer.company.trim(),
                customer.address.as_deref(),
                customer.sector.as_deref(),
                customer.contact_person.as_deref(),
                customer.notes.as_deref(),
                i64::from(customer.call_interval),
                i64::from(customer.visit_interval),
                customer.last_call_date.map(date_to_db),
                customer.last_visit_date.map(date_to_db),
                customer.next_call_date.map(date_to_db),
                customer.next_visit_date.map(date_to_db),
            ],
        )?;
        replace_products(&tx, customer.id, &customer.products)?;
        tx.commit()?;

        debug!(
            "event=customer_insert module=repo status=ok products={}",
            customer.products.len()
        );
        Ok(customer.id)
    }

    fn update_customer(&self, customer: &Customer) -> StoreResult<()> {
        customer.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE customers
             SET
                name = ?2,
                company = ?3,
                address = ?4,
                sector = ?5,
                contact_person = ?6,
                notes = ?7,
                call_interval_days = ?8,
                visit_interval_days = ?9,
                last_call_date = ?10,
                last_visit_date = ?11,
                next_call_date = ?12,
                next_visit_date = ?13,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                customer.id.to_string(),
                customer.name.trim(),
                customer.company.trim(),
                customer.address.as_deref(),
                customer.sector.as_deref(),
                customer.contact_person.as_deref(),
                customer.notes.as_deref(),
                i64::from(customer.call_interval),
                i64::from(customer.visit_interval),
                customer.last_call_date.map(date_to_db),
                customer.last_visit_date.map(date_to_db),
                customer.next_call_date.map(date_to_db),
                customer.next_visit_date.map(date_to_db),
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(customer.id));
        }

        replace_products(&tx, customer.id, &customer.products)?;
        tx.commit()?;
        Ok(())
    }

    fn record_action(&self, id: CustomerId, record: &ActionRecord) -> StoreResult<()> {
        let sql = match record.action {
            ActionType::Call => RECORD_CALL_SQL,
            ActionType::Visit => RECORD_VISIT_SQL,
        };
        let changed = self.conn.execute(
            sql,
            params![
                id.to_string(),
                date_to_db(record.last_date),
                date_to_db(record.next_date),
            ],
        )?;

        if changed == 0 {
            warn!(
                "event=customer_record_action module=repo status=error error_code=not_found action={}",
                record.action
            );
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn get_customer(&self, id: CustomerId) -> StoreResult<Option<Customer>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CUSTOMER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut customer = parse_customer_row(row)?;
            customer.products = load_products(self.conn, customer.id)?;
            return Ok(Some(customer));
        }
        Ok(None)
    }

    fn list_customers(&self, query: &CustomerListQuery) -> StoreResult<Vec<Customer>> {
        let mut sql = format!("{CUSTOMER_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some((action, day)) = query.due_by {
            let column = match action {
                ActionType::Call => "next_call_date",
                ActionType::Visit => "next_visit_date",
            };
            sql.push_str(&format!(" AND {column} IS NOT NULL AND {column} <= ?"));
            bind_values.push(Value::Text(date_to_db(day)));
        }

        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(parse_customer_row(row)?);
        }

        for customer in &mut customers {
            customer.products = load_products(self.conn, customer.id)?;
        }
        Ok(customers)
    }

    fn delete_customer(&self, id: CustomerId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// Formats a day the way the store persists it.
pub fn date_to_db(day: NaiveDate) -> String {
    day.format(DATE_FORMAT).to_string()
}

/// Parses a persisted day, naming the offending column on failure.
pub(crate) fn parse_db_date(value: &str, column: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| StoreError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn parse_db_uuid(value: &str, column: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn ensure_table_exists(conn: &Connection, table: &'static str) -> StoreResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingRequiredTable(table));
    }
    Ok(())
}

fn parse_customer_row(row: &Row<'_>) -> StoreResult<Customer> {
    let id_text: String = row.get("id")?;
    let id = parse_db_uuid(&id_text, "customers.id")?;

    Ok(Customer {
        id,
        name: row.get("name")?,
        company: row.get("company")?,
        address: row.get("address")?,
        sector: row.get("sector")?,
        contact_person: row.get("contact_person")?,
        notes: row.get("notes")?,
        call_interval: parse_interval(row, "call_interval_days")?,
        visit_interval: parse_interval(row, "visit_interval_days")?,
        last_call_date: parse_optional_date(row, "last_call_date")?,
        last_visit_date: parse_optional_date(row, "last_visit_date")?,
        next_call_date: parse_optional_date(row, "next_call_date")?,
        next_visit_date: parse_optional_date(row, "next_visit_date")?,
        products: Vec::new(),
    })
}

fn parse_interval(row: &Row<'_>, column: &str) -> StoreResult<IntervalDays> {
    let raw: i64 = row.get(column)?;
    IntervalDays::new(raw).map_err(|_| {
        StoreError::InvalidData(format!("invalid interval `{raw}` in customers.{column}"))
    })
}

fn parse_optional_date(row: &Row<'_>, column: &str) -> StoreResult<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(column)? {
        Some(value) => Ok(Some(parse_db_date(&value, column)?)),
        None => Ok(None),
    }
}

fn load_products(conn: &Connection, customer_id: CustomerId) -> StoreResult<Vec<Product>> {
    let mut stmt = conn.prepare(
        "SELECT name, average_tonnage
         FROM products
         WHERE customer_id = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([customer_id.to_string()])?;
    let mut products = Vec::new();
    while let Some(row) = rows.next()? {
        products.push(Product {
            name: row.get(0)?,
            average_tonnage: row.get(1)?,
        });
    }
    Ok(products)
}

fn replace_products(
    tx: &Transaction<'_>,
    customer_id: CustomerId,
    products: &[Product],
) -> StoreResult<()> {
    let id_text = customer_id.to_string();
    tx.execute(
        "DELETE FROM products WHERE customer_id = ?1;",
        [id_text.as_str()],
    )?;
    for (position, product) in products.iter().enumerate() {
        tx.execute(
            "INSERT INTO products (customer_id, position, name, average_tonnage)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id_text.as_str(),
                position as i64,
                product.name.trim(),
                product.average_tonnage,
            ],
        )?;
    }
    Ok(())
}
