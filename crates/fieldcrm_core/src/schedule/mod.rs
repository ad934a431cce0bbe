//! Scheduling logic: due-date arithmetic and reminder projection.
//!
//! # Responsibility
//! - Compute next due dates from intervals.
//! - Derive and classify reminders from customer records.
//!
//! # Invariants
//! - Everything here is pure; no function touches storage or the clock
//!   except `interval::today_local`.

pub mod interval;
pub mod projector;
