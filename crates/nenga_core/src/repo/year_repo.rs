//! Year registry and year-rollover persistence.
//!
//! # Responsibility
//! - List and lock years.
//! - Seed one nenga row per current address when a new year is initialized.
//!
//! # Invariants
//! - Rollover for a year runs at most once; a repeated call fails with
//!   `AlreadyInitialized` and writes nothing.
//! - The year row and every seeded nenga row commit in one immediate
//!   transaction. A failed rollover leaves neither behind.
//! - Addresses are enumerated by ascending id, so nenga ids follow address
//!   creation order.

use crate::model::address::AddressId;
use crate::model::nenga::{NengaRecord, Year, YearNumber};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::{bool_to_int, int_to_bool};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::time::Instant;

/// Whether addresses of disabled people are carried into a new year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisabledPersonPolicy {
    /// Disabled people get no card record for the new year.
    #[default]
    Exclude,
    /// Every current address gets a record, whatever the person's flag.
    Include,
}

/// Outcome of a successful rollover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedYear {
    pub year: Year,
    /// Number of nenga rows seeded for the year.
    pub record_count: usize,
}

/// Repository interface for years and rollover.
pub trait YearRepository {
    fn get_year(&self, year: YearNumber) -> RepoResult<Option<Year>>;
    /// Lists all years in ascending order.
    fn list_years(&self) -> RepoResult<Vec<Year>>;
    fn set_year_locked(&self, year: YearNumber, locked: bool) -> RepoResult<()>;
    /// Creates `year` and seeds its card records from current addresses.
    fn initialize_year(
        &self,
        year: YearNumber,
        policy: DisabledPersonPolicy,
    ) -> RepoResult<CreatedYear>;
}

/// SQLite-backed year repository.
pub struct SqliteYearRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteYearRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl YearRepository for SqliteYearRepository<'_> {
    fn get_year(&self, year: YearNumber) -> RepoResult<Option<Year>> {
        load_year(self.conn, year)
    }

    fn list_years(&self) -> RepoResult<Vec<Year>> {
        let mut stmt = self
            .conn
            .prepare("SELECT year, locked FROM years ORDER BY year ASC;")?;
        let mut rows = stmt.query([])?;
        let mut years = Vec::new();
        while let Some(row) = rows.next()? {
            years.push(parse_year_row(row)?);
        }
        Ok(years)
    }

    fn set_year_locked(&self, year: YearNumber, locked: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE years
             SET
                locked = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE year = ?1;",
            params![year, bool_to_int(locked)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Year(year)));
        }
        info!("event=year_lock module=repo status=ok year={year} locked={locked}");
        Ok(())
    }

    fn initialize_year(
        &self,
        year: YearNumber,
        policy: DisabledPersonPolicy,
    ) -> RepoResult<CreatedYear> {
        let started_at = Instant::now();
        info!("event=year_rollover module=repo status=start year={year} policy={policy:?}");

        match seed_year(self.conn, year, policy) {
            Ok(created) => {
                info!(
                    "event=year_rollover module=repo status=ok year={} records={} duration_ms={}",
                    year,
                    created.record_count,
                    started_at.elapsed().as_millis()
                );
                Ok(created)
            }
            Err(err) => {
                error!(
                    "event=year_rollover module=repo status=error year={} duration_ms={} error_kind={:?} error={}",
                    year,
                    started_at.elapsed().as_millis(),
                    err.kind(),
                    err
                );
                Err(err)
            }
        }
    }
}

fn seed_year(
    conn: &Connection,
    year: YearNumber,
    policy: DisabledPersonPolicy,
) -> RepoResult<CreatedYear> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    if load_year(&tx, year)?.is_some() {
        return Err(RepoError::AlreadyInitialized(year));
    }

    tx.execute("INSERT INTO years (year, locked) VALUES (?1, 0);", [year])?;

    let candidates = list_rollover_candidates(&tx, policy)?;
    {
        let mut insert = tx.prepare(
            "INSERT INTO nenga (address_id, year, printing, received, mourning)
             VALUES (?1, ?2, ?3, ?4, ?5);",
        )?;
        for address_id in &candidates {
            insert.execute(params![
                address_id,
                year,
                NengaRecord::DEFAULT_PRINTING.code(),
                NengaRecord::DEFAULT_RECEIVED.code(),
                NengaRecord::DEFAULT_MOURNING.code(),
            ])?;
        }
    }
    tx.commit()?;

    Ok(CreatedYear {
        year: Year {
            year,
            locked: false,
        },
        record_count: candidates.len(),
    })
}

fn list_rollover_candidates(
    conn: &Connection,
    policy: DisabledPersonPolicy,
) -> RepoResult<Vec<AddressId>> {
    let include_disabled = matches!(policy, DisabledPersonPolicy::Include);
    let mut stmt = conn.prepare(
        "SELECT a.id
         FROM addresses a
         INNER JOIN people p ON p.id = a.person_id
         WHERE a.disabled = 0
           AND (?1 = 1 OR p.disabled = 0)
         ORDER BY a.id ASC;",
    )?;
    let mut rows = stmt.query([bool_to_int(include_disabled)])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

/// Loads one year row.
pub(crate) fn load_year(conn: &Connection, year: YearNumber) -> RepoResult<Option<Year>> {
    let loaded = conn
        .query_row(
            "SELECT year, locked FROM years WHERE year = ?1;",
            [year],
            |row| Ok(parse_year_row(row)),
        )
        .optional()?;
    loaded.transpose()
}

fn parse_year_row(row: &Row<'_>) -> RepoResult<Year> {
    Ok(Year {
        year: row.get("year")?,
        locked: int_to_bool(row.get("locked")?, "years.locked")?,
    })
}
