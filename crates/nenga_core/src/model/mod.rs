//! Domain model for the nenga address book.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Validate user input before it reaches persistence.
//!
//! # Invariants
//! - A person has at most one current address; the rest are history.
//! - Card status values are closed enums, never raw integers, above storage.

pub mod address;
pub mod nenga;
pub mod person;
pub mod validation;
