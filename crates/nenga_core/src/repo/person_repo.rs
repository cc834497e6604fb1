//! Person repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Person names are written once at creation and never updated.
//! - Listing order is ascending id (creation order).

use crate::model::person::{NewPerson, Person, PersonId};
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::{bool_to_int, int_to_bool};
use log::info;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    id,
    family_name,
    given_name,
    disabled,
    updated_at
FROM people";

/// Repository interface for people.
pub trait PersonRepository {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person>;
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn list_people(&self, include_disabled: bool) -> RepoResult<Vec<Person>>;
    fn set_person_disabled(&self, id: PersonId, disabled: bool) -> RepoResult<()>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        self.conn.execute(
            "INSERT INTO people (family_name, given_name, disabled)
             VALUES (?1, ?2, 0);",
            params![person.family_name.as_str(), person.given_name.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("event=person_create module=repo status=ok person_id={id}");

        self.get_person(id)?
            .ok_or(RepoError::NotFound(EntityRef::Person(id)))
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let person = self
            .conn
            .query_row(
                &format!("{PERSON_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_person_row(row)),
            )
            .optional()?;
        person.transpose()
    }

    fn list_people(&self, include_disabled: bool) -> RepoResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSON_SELECT_SQL}
             WHERE (?1 = 1 OR disabled = 0)
             ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([bool_to_int(include_disabled)])?;
        let mut people = Vec::new();
        while let Some(row) = rows.next()? {
            people.push(parse_person_row(row)?);
        }
        Ok(people)
    }

    fn set_person_disabled(&self, id: PersonId, disabled: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE people
             SET
                disabled = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, bool_to_int(disabled)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Person(id)));
        }
        info!("event=person_disable module=repo status=ok person_id={id} disabled={disabled}");
        Ok(())
    }
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    Ok(Person {
        id: row.get("id")?,
        family_name: row.get("family_name")?,
        given_name: row.get("given_name")?,
        disabled: int_to_bool(row.get("disabled")?, "people.disabled")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Returns whether a person row exists.
pub(crate) fn person_exists(conn: &Connection, id: PersonId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM people WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
