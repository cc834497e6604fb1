//! Subcommand implementations.
//!
//! # Invariants
//! - Every command opens its own connection and drops it before returning.
//! - The clock is read here only; core services receive explicit years.

use crate::args::GenengaArgs;
use crate::config::{Config, ConfigError};
use chrono::{Datelike, Local, NaiveDate};
use log::info;
use nenga_core::db::migrations::recreate_schema;
use nenga_core::{
    export_year, open_db_with_options, write_rows_atomically, DbError, ErrorKind, ExportError,
    ExportOptions, LoggingError, RepoError, RolloverService, SqliteNengaLedger,
    SqliteYearRepository, YearNumber,
};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    Export(ExportError),
    Io(std::io::Error),
}

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::InvalidArgument,
            Self::Logging(LoggingError::Io { .. } | LoggingError::Backend(_)) => {
                ErrorKind::StorageError
            }
            Self::Logging(_) => ErrorKind::InvalidArgument,
            Self::Db(_) | Self::Io(_) => ErrorKind::StorageError,
            Self::Repo(err) => err.kind(),
            Self::Export(err) => err.kind(),
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        exit_code(self.kind())
    }
}

pub fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::StorageError => 1,
        ErrorKind::InvalidArgument => 2,
        ErrorKind::AlreadyInitialized => 3,
        ErrorKind::EncodingError => 4,
        ErrorKind::NotFound => 5,
        ErrorKind::InUse => 6,
        ErrorKind::YearLocked => 7,
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<ExportError> for CliError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Opens the configured database, creating its parent directory if needed.
pub fn open_connection(config: &Config) -> CliResult<Connection> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(open_db_with_options(&config.db_path, config.open_options())?)
}

pub fn initdb(config: &Config, drop_create: bool) -> CliResult<()> {
    let mut conn = open_connection(config)?;
    if drop_create {
        recreate_schema(&mut conn)?;
    }
    info!("event=initdb module=cli status=ok drop_create={drop_create}");
    println!("initialized database at {}", config.db_path.display());
    Ok(())
}

pub fn nextyear(config: &Config, today: NaiveDate) -> CliResult<()> {
    let conn = open_connection(config)?;
    let created = RolloverService::new(SqliteYearRepository::new(&conn))
        .initialize_next_year(today.year())?;
    println!(
        "initialized year {} with {} nenga record(s)",
        created.year.year, created.record_count
    );
    Ok(())
}

pub fn genenga(config: &Config, args: &GenengaArgs, today: NaiveDate) -> CliResult<()> {
    let year = args.year.unwrap_or_else(|| default_export_year(today));
    let options = ExportOptions {
        later_only: args.later_only,
        exclude_mourning: !args.include_mourning,
        split_zipcode: !args.nosplit_zipcode,
    };

    let conn = open_connection(config)?;
    let rows = export_year(&SqliteNengaLedger::new(&conn), year, &options)?;
    drop(conn);

    let written = write_rows_atomically(&args.output, &rows, &args.encoding)?;
    println!(
        "exported {} row(s) for year {} to {} ({} bytes)",
        rows.len(),
        year,
        args.output.display(),
        written
    );
    Ok(())
}

/// This year in January, next year otherwise.
pub fn default_export_year(today: NaiveDate) -> YearNumber {
    if today.month() == 1 {
        today.year()
    } else {
        today.year() + 1
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::{default_export_year, exit_code};
    use chrono::NaiveDate;
    use nenga_core::ErrorKind;

    #[test]
    fn default_export_year_follows_the_card_season() {
        let january = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let december = NaiveDate::from_ymd_opt(2025, 12, 20).unwrap();
        let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        assert_eq!(default_export_year(january), 2026);
        assert_eq!(default_export_year(december), 2026);
        assert_eq!(default_export_year(june), 2026);
    }

    #[test]
    fn exit_codes_are_distinct_per_kind() {
        assert_eq!(exit_code(ErrorKind::StorageError), 1);
        assert_eq!(exit_code(ErrorKind::InvalidArgument), 2);
        assert_eq!(exit_code(ErrorKind::AlreadyInitialized), 3);
        assert_eq!(exit_code(ErrorKind::EncodingError), 4);
        assert_eq!(exit_code(ErrorKind::NotFound), 5);
        assert_eq!(exit_code(ErrorKind::InUse), 6);
        assert_eq!(exit_code(ErrorKind::YearLocked), 7);
    }
}
