//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes take validated model values, never raw form input.
//! - Multi-row writes run inside one `BEGIN IMMEDIATE` transaction.
//! - Repository APIs return semantic errors (`NotFound`, `InUse`, ...) in
//!   addition to DB transport errors.

pub mod address_repo;
pub mod error;
pub mod nenga_repo;
pub mod person_repo;
pub mod year_repo;

use error::{RepoError, RepoResult};

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &'static str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid flag value `{other}` in {column}"
        ))),
    }
}
