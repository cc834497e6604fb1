//! Address store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Keep the append-only address history of every person.
//! - Decide which address is current and swap it atomically.
//! - Guard deletion of addresses that still carry history.
//!
//! # Invariants
//! - Current is encoded in-row: `disabled = 0` is current, `disabled = 1` is
//!   superseded. The partial unique index `idx_addresses_one_current` makes a
//!   second current address per person unrepresentable.
//! - `set_current` demotes and promotes inside one immediate transaction, so
//!   no reader observes zero or two current addresses for a person that has
//!   one.
//! - Addresses that are current or referenced by nenga rows are never deleted.

use crate::model::address::{Address, AddressId, NewAddress};
use crate::model::person::PersonId;
use crate::repo::error::{EntityRef, InUseReason, RepoError, RepoResult};
use crate::repo::int_to_bool;
use crate::repo::person_repo::person_exists;
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};

pub(crate) const ADDRESS_COLUMNS_SQL: &str = "a.id AS address_id,
    a.person_id AS person_id,
    a.family_name AS family_name,
    a.given_name AS given_name,
    a.joint_name1 AS joint_name1,
    a.joint_name2 AS joint_name2,
    a.zipcode AS zipcode,
    a.address1 AS address1,
    a.address2 AS address2,
    a.disabled AS address_disabled,
    a.updated_at AS address_updated_at";

/// Address history and current-address designation per person.
pub trait AddressStore {
    /// Inserts a new address for `person_id`.
    ///
    /// The first address of a person is always made current; later ones only
    /// when `make_current` is set.
    fn add_address(
        &self,
        person_id: PersonId,
        address: &NewAddress,
        make_current: bool,
    ) -> RepoResult<Address>;
    fn get_address(&self, address_id: AddressId) -> RepoResult<Option<Address>>;
    /// Returns the single non-superseded address of a person, if any.
    fn current_address(&self, person_id: PersonId) -> RepoResult<Option<Address>>;
    /// Returns every address ever stored for a person, oldest first.
    fn address_history(&self, person_id: PersonId) -> RepoResult<Vec<Address>>;
    /// Makes `address_id` current and supersedes the previous current address.
    fn set_current(&self, person_id: PersonId, address_id: AddressId) -> RepoResult<()>;
    /// Deletes an address that is neither current nor referenced by nenga rows.
    fn retire(&self, address_id: AddressId) -> RepoResult<()>;
}

/// SQLite-backed address store.
pub struct SqliteAddressStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAddressStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AddressStore for SqliteAddressStore<'_> {
    fn add_address(
        &self,
        person_id: PersonId,
        address: &NewAddress,
        make_current: bool,
    ) -> RepoResult<Address> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !person_exists(&tx, person_id)? {
            return Err(RepoError::NotFound(EntityRef::Person(person_id)));
        }

        let has_current = current_address_id(&tx, person_id)?.is_some();
        let becomes_current = make_current || !has_current;
        if becomes_current && has_current {
            demote_current(&tx, person_id)?;
        }

        tx.execute(
            "INSERT INTO addresses (
                person_id,
                family_name,
                given_name,
                joint_name1,
                joint_name2,
                zipcode,
                address1,
                address2,
                disabled
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
            params![
                person_id,
                address.family_name.as_str(),
                address.given_name.as_str(),
                address.joint_name1.as_deref(),
                address.joint_name2.as_deref(),
                address.zipcode.as_str(),
                address.address1.as_str(),
                address.address2.as_deref(),
                if becomes_current { 0 } else { 1 },
            ],
        )?;
        let address_id = tx.last_insert_rowid();
        tx.commit()?;

        info!(
            "event=address_add module=repo status=ok person_id={person_id} address_id={address_id} current={becomes_current}"
        );
        load_required_address(self.conn, address_id)
    }

    fn get_address(&self, address_id: AddressId) -> RepoResult<Option<Address>> {
        load_address(self.conn, address_id)
    }

    fn current_address(&self, person_id: PersonId) -> RepoResult<Option<Address>> {
        ensure_person_exists(self.conn, person_id)?;
        let address = self
            .conn
            .query_row(
                &format!(
                    "SELECT {ADDRESS_COLUMNS_SQL}
                     FROM addresses a
                     WHERE a.person_id = ?1
                       AND a.disabled = 0;"
                ),
                [person_id],
                |row| Ok(parse_address_row(row)),
            )
            .optional()?;
        address.transpose()
    }

    fn address_history(&self, person_id: PersonId) -> RepoResult<Vec<Address>> {
        ensure_person_exists(self.conn, person_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ADDRESS_COLUMNS_SQL}
             FROM addresses a
             WHERE a.person_id = ?1
             ORDER BY a.id ASC;"
        ))?;
        let mut rows = stmt.query([person_id])?;
        let mut addresses = Vec::new();
        while let Some(row) = rows.next()? {
            addresses.push(parse_address_row(row)?);
        }
        Ok(addresses)
    }

    fn set_current(&self, person_id: PersonId, address_id: AddressId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let not_found = RepoError::NotFound(EntityRef::AddressOfPerson {
            person_id,
            address_id,
        });
        let (owner_id, already_current) = match address_owner(&tx, address_id)? {
            Some(owner) => owner,
            None => return Err(not_found),
        };
        if owner_id != person_id {
            return Err(not_found);
        }
        if already_current {
            return Ok(());
        }

        demote_current(&tx, person_id)?;
        tx.execute(
            "UPDATE addresses
             SET
                disabled = 0,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            [address_id],
        )?;
        tx.commit()?;

        info!(
            "event=address_set_current module=repo status=ok person_id={person_id} address_id={address_id}"
        );
        Ok(())
    }

    fn retire(&self, address_id: AddressId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let (_, is_current) = address_owner(&tx, address_id)?
            .ok_or(RepoError::NotFound(EntityRef::Address(address_id)))?;
        if is_current {
            return Err(RepoError::InUse {
                address_id,
                reason: InUseReason::Current,
            });
        }

        let card_records: u64 = tx.query_row(
            "SELECT COUNT(*) FROM nenga WHERE address_id = ?1;",
            [address_id],
            |row| row.get(0),
        )?;
        if card_records > 0 {
            return Err(RepoError::InUse {
                address_id,
                reason: InUseReason::CardRecords(card_records),
            });
        }

        tx.execute("DELETE FROM addresses WHERE id = ?1;", [address_id])?;
        tx.commit()?;

        info!("event=address_retire module=repo status=ok address_id={address_id}");
        Ok(())
    }
}

/// Parses the address columns selected by `ADDRESS_COLUMNS_SQL`.
pub(crate) fn parse_address_row(row: &Row<'_>) -> RepoResult<Address> {
    let disabled = int_to_bool(row.get("address_disabled")?, "addresses.disabled")?;
    Ok(Address {
        id: row.get("address_id")?,
        person_id: row.get("person_id")?,
        family_name: row.get("family_name")?,
        given_name: row.get("given_name")?,
        joint_name1: row.get("joint_name1")?,
        joint_name2: row.get("joint_name2")?,
        zipcode: row.get("zipcode")?,
        address1: row.get("address1")?,
        address2: row.get("address2")?,
        is_current: !disabled,
        updated_at: row.get("address_updated_at")?,
    })
}

fn load_address(conn: &Connection, address_id: AddressId) -> RepoResult<Option<Address>> {
    let address = conn
        .query_row(
            &format!(
                "SELECT {ADDRESS_COLUMNS_SQL}
                 FROM addresses a
                 WHERE a.id = ?1;"
            ),
            [address_id],
            |row| Ok(parse_address_row(row)),
        )
        .optional()?;
    address.transpose()
}

fn load_required_address(conn: &Connection, address_id: AddressId) -> RepoResult<Address> {
    load_address(conn, address_id)?.ok_or(RepoError::NotFound(EntityRef::Address(address_id)))
}

fn ensure_person_exists(conn: &Connection, person_id: PersonId) -> RepoResult<()> {
    if person_exists(conn, person_id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound(EntityRef::Person(person_id)))
    }
}

/// Returns `(person_id, is_current)` for an address.
fn address_owner(conn: &Connection, address_id: AddressId) -> RepoResult<Option<(PersonId, bool)>> {
    let owner: Option<(PersonId, i64)> = conn
        .query_row(
            "SELECT person_id, disabled FROM addresses WHERE id = ?1;",
            [address_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    owner
        .map(|(person_id, disabled)| {
            int_to_bool(disabled, "addresses.disabled").map(|disabled| (person_id, !disabled))
        })
        .transpose()
}

fn current_address_id(conn: &Connection, person_id: PersonId) -> RepoResult<Option<AddressId>> {
    let id = conn
        .query_row(
            "SELECT id FROM addresses WHERE person_id = ?1 AND disabled = 0;",
            [person_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

fn demote_current(conn: &Connection, person_id: PersonId) -> RepoResult<()> {
    conn.execute(
        "UPDATE addresses
         SET
            disabled = 1,
            updated_at = (strftime('%s', 'now') * 1000)
         WHERE person_id = ?1
           AND disabled = 0;",
        [person_id],
    )?;
    Ok(())
}
