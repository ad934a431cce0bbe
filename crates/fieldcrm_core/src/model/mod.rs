//! Domain model for customers and derived reminders.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep customer records and reminder projections in separate shapes.
//!
//! # Invariants
//! - Every customer is identified by a stable `CustomerId`.
//! - Reminders are derived read models and carry no identity of their own.

pub mod customer;
pub mod reminder;
pub mod validation;
