//! Card record ledger use-case service.
//!
//! # Responsibility
//! - Decode bulk actions (`printing_2`, `mourning_1`, ...) into typed updates.
//! - Delegate listing and mutation to the ledger repository.

use crate::model::nenga::{
    BulkUpdate, NengaEntry, NengaId, NengaRecord, StatusChange, YearNumber,
};
use crate::repo::error::RepoResult;
use crate::repo::nenga_repo::NengaLedger;

/// Ledger facade over repository implementations.
pub struct LedgerService<L: NengaLedger> {
    ledger: L,
}

impl<L: NengaLedger> LedgerService<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    pub fn list_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaRecord>> {
        self.ledger.list_by_year(year)
    }

    pub fn list_entries_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaEntry>> {
        self.ledger.list_entries_by_year(year)
    }

    pub fn get_entry(&self, id: NengaId) -> RepoResult<Option<NengaEntry>> {
        self.ledger.get_entry(id)
    }

    pub fn bulk_set_field(&self, year: YearNumber, update: &BulkUpdate) -> RepoResult<usize> {
        self.ledger.bulk_set_field(year, update)
    }

    /// Applies a `<field>_<value>` action to the selected records.
    ///
    /// An undecodable action fails with `InvalidArgument` before storage is
    /// touched.
    pub fn apply_bulk_action(
        &self,
        year: YearNumber,
        action: &str,
        ids: impl IntoIterator<Item = NengaId>,
    ) -> RepoResult<usize> {
        let change: StatusChange = action.parse()?;
        self.ledger.bulk_set_field(year, &BulkUpdate::new(ids, change))
    }
}
