//! Person domain model.
//!
//! # Invariants
//! - Identity names never change after creation.
//! - `disabled` means "will never receive a card again"; disabled people keep
//!   their address history and past card records.

use crate::model::validation::{required_text, ValidationError, NAME_MAX_CHARS};
use serde::{Deserialize, Serialize};

/// Row id of a person. Assigned by storage in insertion order.
pub type PersonId = i64;

/// Stored person identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub family_name: String,
    pub given_name: String,
    pub disabled: bool,
    /// Update timestamp in epoch milliseconds.
    pub updated_at: i64,
}

/// Validated input for creating a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub family_name: String,
    pub given_name: String,
}

impl NewPerson {
    /// Trims and validates both names.
    pub fn new(family_name: &str, given_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            family_name: required_text("family_name", family_name, NAME_MAX_CHARS)?,
            given_name: required_text("given_name", given_name, NAME_MAX_CHARS)?,
        })
    }
}
