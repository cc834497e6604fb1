//! Card record ledger contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read card records of one year in rollover order.
//! - Apply typed bulk status updates.
//!
//! # Invariants
//! - Listing order is ascending nenga id.
//! - `bulk_set_field` is the only mutation path after rollover. It rejects
//!   unknown and locked years and touches only rows of the given year.
//! - A bulk update commits in one immediate transaction.

use crate::model::nenga::{
    BulkUpdate, MourningStatus, NengaEntry, NengaId, NengaRecord, PrintingStatus,
    ReceivedStatus, YearNumber,
};
use crate::repo::address_repo::{parse_address_row, ADDRESS_COLUMNS_SQL};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::year_repo::load_year;
use log::info;
use rusqlite::types::Value;
use rusqlite::{
    params_from_iter, Connection, OptionalExtension, Row, Transaction, TransactionBehavior,
};

/// Ids bound per `UPDATE`, well below SQLite's host parameter limit.
const BULK_UPDATE_CHUNK: usize = 500;

const NENGA_COLUMNS_SQL: &str = "n.id AS nenga_id,
    n.address_id AS nenga_address_id,
    n.year AS year,
    n.printing AS printing,
    n.received AS received,
    n.mourning AS mourning,
    n.updated_at AS nenga_updated_at";

/// Repository interface for card records.
pub trait NengaLedger {
    /// Lists records of `year`, ascending id.
    fn list_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaRecord>>;
    /// Lists records of `year` joined with their addresses, ascending id.
    fn list_entries_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaEntry>>;
    fn get_entry(&self, id: NengaId) -> RepoResult<Option<NengaEntry>>;
    /// Applies one status change to every listed record of `year`.
    ///
    /// Ids that do not exist in `year` are ignored. Returns the number of
    /// rows changed.
    fn bulk_set_field(&self, year: YearNumber, update: &BulkUpdate) -> RepoResult<usize>;
}

/// SQLite-backed card record ledger.
pub struct SqliteNengaLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNengaLedger<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NengaLedger for SqliteNengaLedger<'_> {
    fn list_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaRecord>> {
        ensure_year_exists(self.conn, year)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NENGA_COLUMNS_SQL}
             FROM nenga n
             WHERE n.year = ?1
             ORDER BY n.id ASC;"
        ))?;
        let mut rows = stmt.query([year])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_nenga_row(row)?);
        }
        Ok(records)
    }

    fn list_entries_by_year(&self, year: YearNumber) -> RepoResult<Vec<NengaEntry>> {
        ensure_year_exists(self.conn, year)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NENGA_COLUMNS_SQL}, {ADDRESS_COLUMNS_SQL}
             FROM nenga n
             INNER JOIN addresses a ON a.id = n.address_id
             WHERE n.year = ?1
             ORDER BY n.id ASC;"
        ))?;
        let mut rows = stmt.query([year])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_entry_row(row)?);
        }
        Ok(entries)
    }

    fn get_entry(&self, id: NengaId) -> RepoResult<Option<NengaEntry>> {
        let entry = self
            .conn
            .query_row(
                &format!(
                    "SELECT {NENGA_COLUMNS_SQL}, {ADDRESS_COLUMNS_SQL}
                     FROM nenga n
                     INNER JOIN addresses a ON a.id = n.address_id
                     WHERE n.id = ?1;"
                ),
                [id],
                |row| Ok(parse_entry_row(row)),
            )
            .optional()?;
        entry.transpose()
    }

    fn bulk_set_field(&self, year: YearNumber, update: &BulkUpdate) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let loaded = load_year(&tx, year)?.ok_or(RepoError::NotFound(EntityRef::Year(year)))?;
        if loaded.locked {
            return Err(RepoError::YearLocked(year));
        }
        if update.ids.is_empty() {
            return Ok(0);
        }

        // Column name comes from the closed `NengaField` enum, never from input.
        let column = update.change.field().column();
        let ids: Vec<NengaId> = update.ids.iter().copied().collect();
        let mut changed = 0;
        for chunk in ids.chunks(BULK_UPDATE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "UPDATE nenga
                 SET
                    {column} = ?,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE year = ?
                   AND id IN ({placeholders});"
            );
            let mut bind_values = vec![
                Value::Integer(update.change.code()),
                Value::Integer(i64::from(year)),
            ];
            bind_values.extend(chunk.iter().map(|id| Value::Integer(*id)));
            changed += tx.execute(&sql, params_from_iter(bind_values))?;
        }
        tx.commit()?;

        info!(
            "event=bulk_update module=repo status=ok year={} field={} value={} requested={} changed={}",
            year,
            update.change.field(),
            update.change.code(),
            update.ids.len(),
            changed
        );
        Ok(changed)
    }
}

fn ensure_year_exists(conn: &Connection, year: YearNumber) -> RepoResult<()> {
    match load_year(conn, year)? {
        Some(_) => Ok(()),
        None => Err(RepoError::NotFound(EntityRef::Year(year))),
    }
}

fn parse_entry_row(row: &Row<'_>) -> RepoResult<NengaEntry> {
    Ok(NengaEntry {
        record: parse_nenga_row(row)?,
        address: parse_address_row(row)?,
    })
}

fn parse_nenga_row(row: &Row<'_>) -> RepoResult<NengaRecord> {
    let printing_code: i64 = row.get("printing")?;
    let printing = PrintingStatus::from_code(printing_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid printing value `{printing_code}` in nenga.printing"
        ))
    })?;

    let received_code: i64 = row.get("received")?;
    let received = ReceivedStatus::from_code(received_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid received value `{received_code}` in nenga.received"
        ))
    })?;

    let mourning_code: i64 = row.get("mourning")?;
    let mourning = MourningStatus::from_code(mourning_code).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid mourning value `{mourning_code}` in nenga.mourning"
        ))
    })?;

    Ok(NengaRecord {
        id: row.get("nenga_id")?,
        address_id: row.get("nenga_address_id")?,
        year: row.get("year")?,
        printing,
        received,
        mourning,
        updated_at: row.get("nenga_updated_at")?,
    })
}
