//! genenga-compatible CSV export.
//!
//! # Responsibility
//! - Project one year of card records into genenga rows.
//! - Serialize rows as CSV in a caller-selected character encoding.
//! - Write the output file atomically.
//!
//! # Invariants
//! - Export never consults `received`.
//! - `joint_name2` is never exported.
//! - A failed export leaves no output file behind.

use crate::repo::error::{ErrorKind, RepoError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod csv_writer;
pub mod genenga;

pub use csv_writer::{encode_rows, resolve_encoding, write_rows_atomically};
pub use genenga::{export_year, project_row, should_print, ExportOptions, GenengaRow};

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug)]
pub enum ExportError {
    Repo(RepoError),
    /// Encoding label is unknown or cannot be used for output.
    UnsupportedEncoding(String),
    /// Character cannot be represented in the target encoding.
    Unrepresentable {
        encoding: &'static str,
        character: char,
    },
    Csv(csv::Error),
    Io(std::io::Error),
}

impl ExportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Repo(err) => err.kind(),
            Self::UnsupportedEncoding(_) => ErrorKind::InvalidArgument,
            Self::Unrepresentable { .. } => ErrorKind::EncodingError,
            Self::Csv(_) | Self::Io(_) => ErrorKind::StorageError,
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::UnsupportedEncoding(label) => {
                write!(f, "unsupported output encoding `{label}`")
            }
            Self::Unrepresentable {
                encoding,
                character,
            } => write!(
                f,
                "character `{character}` (U+{:04X}) cannot be encoded as {encoding}",
                u32::from(*character)
            ),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::UnsupportedEncoding(_) | Self::Unrepresentable { .. } => None,
        }
    }
}

impl From<RepoError> for ExportError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<csv::Error> for ExportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for ExportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
