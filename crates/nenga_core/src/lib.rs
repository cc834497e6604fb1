//! Core domain logic for the nenga address book.
//! Storage, year rollover, the card ledger and genenga export live here;
//! the CLI and web front-ends only translate input and output.

pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, open_db_with_options, DbError, OpenOptions};
pub use export::{
    export_year, project_row, resolve_encoding, should_print, write_rows_atomically, ExportError,
    ExportOptions, ExportResult, GenengaRow,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::address::{Address, AddressId, AddressInput, NewAddress};
pub use model::nenga::{
    BulkUpdate, MourningStatus, NengaEntry, NengaField, NengaId, NengaRecord, PrintingStatus,
    ReceivedStatus, StatusChange, StatusChangeError, Year, YearNumber,
};
pub use model::person::{NewPerson, Person, PersonId};
pub use model::validation::ValidationError;
pub use repo::address_repo::{AddressStore, SqliteAddressStore};
pub use repo::error::{EntityRef, ErrorKind, InUseReason, RepoError, RepoResult};
pub use repo::nenga_repo::{NengaLedger, SqliteNengaLedger};
pub use repo::person_repo::{PersonRepository, SqlitePersonRepository};
pub use repo::year_repo::{CreatedYear, DisabledPersonPolicy, SqliteYearRepository, YearRepository};
pub use service::address_book_service::{AddressBookService, PersonOverview};
pub use service::ledger_service::LedgerService;
pub use service::rollover_service::RolloverService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
