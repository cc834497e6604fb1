//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Turn raw caller input into validated model values.
//! - Keep CLI/HTTP layers decoupled from storage details.

pub mod address_book_service;
pub mod ledger_service;
pub mod rollover_service;
