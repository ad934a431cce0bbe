//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod calendar_service;
pub mod completion_service;
pub mod customer_service;
pub mod reminder_service;
pub mod report_service;
