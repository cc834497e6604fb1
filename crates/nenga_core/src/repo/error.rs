//! Repository error type shared by every SQLite repository.
//!
//! # Invariants
//! - Every variant maps to exactly one `ErrorKind`.
//! - Storage failures are surfaced unchanged and never retried.

use crate::db::DbError;
use crate::model::address::AddressId;
use crate::model::nenga::{NengaId, StatusChangeError, YearNumber};
use crate::model::person::PersonId;
use crate::model::validation::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Caller-facing error taxonomy used for exit codes and HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    AlreadyInitialized,
    InUse,
    InvalidArgument,
    YearLocked,
    EncodingError,
    StorageError,
}

/// Entity referenced by a `NotFound` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Person(PersonId),
    Address(AddressId),
    /// Address exists but belongs to another person, or does not exist.
    AddressOfPerson {
        person_id: PersonId,
        address_id: AddressId,
    },
    Nenga(NengaId),
    Year(YearNumber),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person(id) => write!(f, "person {id}"),
            Self::Address(id) => write!(f, "address {id}"),
            Self::AddressOfPerson {
                person_id,
                address_id,
            } => write!(f, "address {address_id} of person {person_id}"),
            Self::Nenga(id) => write!(f, "nenga {id}"),
            Self::Year(year) => write!(f, "year {year}"),
        }
    }
}

/// Why an address cannot be retired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InUseReason {
    /// Address is its person's current address.
    Current,
    /// Card records reference the address.
    CardRecords(u64),
}

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    InvalidStatusChange(StatusChangeError),
    Db(DbError),
    NotFound(EntityRef),
    AlreadyInitialized(YearNumber),
    InUse {
        address_id: AddressId,
        reason: InUseReason,
    },
    YearLocked(YearNumber),
    InvalidData(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidStatusChange(_) => ErrorKind::InvalidArgument,
            Self::Db(_) | Self::InvalidData(_) => ErrorKind::StorageError,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            Self::InUse { .. } => ErrorKind::InUse,
            Self::YearLocked(_) => ErrorKind::YearLocked,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidStatusChange(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::AlreadyInitialized(year) => {
                write!(f, "nenga data for year {year} are already initialized")
            }
            Self::InUse {
                address_id,
                reason: InUseReason::Current,
            } => write!(f, "address {address_id} is the current address"),
            Self::InUse {
                address_id,
                reason: InUseReason::CardRecords(count),
            } => write!(
                f,
                "address {address_id} is referenced by {count} nenga record(s)"
            ),
            Self::YearLocked(year) => write!(f, "year {year} is locked"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidStatusChange(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StatusChangeError> for RepoError {
    fn from(value: StatusChangeError) -> Self {
        Self::InvalidStatusChange(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
