//! Calendar entry repository.
//!
//! # Responsibility
//! - Persist planned calls/visits shown in the calendar view.
//! - Read entries for a date window joined with customer names.
//!
//! # Invariants
//! - Entries always reference an existing customer (FK, cascade on delete).
//! - Only a foreign-key violation maps to `NotFound`; other failures pass through.
//! - Window reads are ordered by date, then creation order.

use crate::model::customer::{ActionType, CustomerId};
use crate::repo::customer_repo::{
    date_to_db, ensure_table_exists, parse_db_date, parse_db_uuid, StoreError, StoreResult,
};
use chrono::NaiveDate;
use rusqlite::{ffi, params, Connection, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CalendarEntryId = Uuid;

/// Planned action on a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub id: CalendarEntryId,
    pub customer_id: CustomerId,
    /// Filled on read; ignored on write.
    pub customer_name: String,
    pub date: NaiveDate,
    pub action: ActionType,
    pub notes: Option<String>,
}

impl CalendarEntry {
    pub fn new(
        customer_id: CustomerId,
        date: NaiveDate,
        action: ActionType,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            customer_name: String::new(),
            date,
            action,
            notes,
        }
    }
}

/// Repository interface for calendar entries.
pub trait CalendarRepository {
    fn create_entry(&self, entry: &CalendarEntry) -> StoreResult<CalendarEntryId>;
    /// Entries with `from <= date <= to`.
    fn list_entries(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<CalendarEntry>>;
    fn delete_entry(&self, id: CalendarEntryId) -> StoreResult<()>;
}

/// SQLite-backed calendar repository.
pub struct SqliteCalendarRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for table in ["customers", "calendar_entries"] {
            ensure_table_exists(conn, table)?;
        }
        Ok(Self { conn })
    }
}

impl CalendarRepository for SqliteCalendarRepository<'_> {
    fn create_entry(&self, entry: &CalendarEntry) -> StoreResult<CalendarEntryId> {
        let notes = entry
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let inserted = self.conn.execute(
            "INSERT INTO calendar_entries (id, customer_id, entry_date, action, notes)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                entry.id.to_string(),
                entry.customer_id.to_string(),
                date_to_db(entry.date),
                entry.action.as_str(),
                notes,
            ],
        );

        match inserted {
            Ok(_) => Ok(entry.id),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                Err(StoreError::NotFound(entry.customer_id))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn list_entries(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<CalendarEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                e.id,
                e.customer_id,
                c.name AS customer_name,
                e.entry_date,
                e.action,
                e.notes
             FROM calendar_entries e
             INNER JOIN customers c ON c.id = e.customer_id
             WHERE e.entry_date >= ?1 AND e.entry_date <= ?2
             ORDER BY e.entry_date ASC, e.created_at ASC, e.rowid ASC;",
        )?;
        let mut rows = stmt.query(params![date_to_db(from), date_to_db(to)])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn delete_entry(&self, id: CalendarEntryId) -> StoreResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM calendar_entries WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_entry_row(row: &Row<'_>) -> StoreResult<CalendarEntry> {
    let id_text: String = row.get("id")?;
    let customer_text: String = row.get("customer_id")?;
    let date_text: String = row.get("entry_date")?;
    let action_text: String = row.get("action")?;
    let action = ActionType::parse(&action_text).map_err(|_| {
        StoreError::InvalidData(format!(
            "invalid action `{action_text}` in calendar_entries.action"
        ))
    })?;

    Ok(CalendarEntry {
        id: parse_db_uuid(&id_text, "calendar_entries.id")?,
        customer_id: parse_db_uuid(&customer_text, "calendar_entries.customer_id")?,
        customer_name: row.get("customer_name")?,
        date: parse_db_date(&date_text, "calendar_entries.entry_date")?,
        action,
        notes: row.get("notes")?,
    })
}
