//! Address book use-case service.
//!
//! # Responsibility
//! - Create people and their addresses from raw caller input.
//! - Switch current addresses and retire unused ones.
//! - Build the person overview shown on the index page.
//!
//! # Invariants
//! - Raw input is validated here; repositories only see `NewPerson` and
//!   `NewAddress` values.
//! - Service APIs never bypass repository transactions.

use crate::model::address::{Address, AddressId, AddressInput, NewAddress};
use crate::model::person::{NewPerson, Person, PersonId};
use crate::repo::address_repo::AddressStore;
use crate::repo::error::{EntityRef, RepoError, RepoResult};
use crate::repo::person_repo::PersonRepository;
use serde::Serialize;

/// Person together with its current address, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonOverview {
    pub person: Person,
    pub current_address: Option<Address>,
    /// Number of addresses in the person's history, current included.
    pub address_count: usize,
}

/// Address book facade over person and address repositories.
pub struct AddressBookService<P: PersonRepository, A: AddressStore> {
    people: P,
    addresses: A,
}

impl<P: PersonRepository, A: AddressStore> AddressBookService<P, A> {
    pub fn new(people: P, addresses: A) -> Self {
        Self { people, addresses }
    }

    /// Creates an enabled person from raw names.
    pub fn create_person(&self, family_name: &str, given_name: &str) -> RepoResult<Person> {
        let person = NewPerson::new(family_name, given_name)?;
        self.people.create_person(&person)
    }

    pub fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.people.get_person(id)
    }

    pub fn set_person_disabled(&self, id: PersonId, disabled: bool) -> RepoResult<()> {
        self.people.set_person_disabled(id, disabled)
    }

    /// Lists people with their current address, ascending person id.
    pub fn people_overview(&self, include_disabled: bool) -> RepoResult<Vec<PersonOverview>> {
        let people = self.people.list_people(include_disabled)?;
        let mut overview = Vec::with_capacity(people.len());
        for person in people {
            let history = self.addresses.address_history(person.id)?;
            let address_count = history.len();
            let current_address = history.into_iter().find(|address| address.is_current);
            overview.push(PersonOverview {
                person,
                current_address,
                address_count,
            });
        }
        Ok(overview)
    }

    /// Validates and stores a new address for `person_id`.
    pub fn add_address(
        &self,
        person_id: PersonId,
        input: &AddressInput,
        make_current: bool,
    ) -> RepoResult<Address> {
        let address = NewAddress::parse(input)?;
        self.addresses.add_address(person_id, &address, make_current)
    }

    /// Pre-filled input for a new address form: the person's own names.
    pub fn address_template(&self, person_id: PersonId) -> RepoResult<Option<AddressInput>> {
        Ok(self.people.get_person(person_id)?.map(|person| AddressInput {
            family_name: person.family_name,
            given_name: person.given_name,
            ..AddressInput::default()
        }))
    }

    pub fn current_address(&self, person_id: PersonId) -> RepoResult<Option<Address>> {
        self.addresses.current_address(person_id)
    }

    pub fn address_history(&self, person_id: PersonId) -> RepoResult<Vec<Address>> {
        self.addresses.address_history(person_id)
    }

    pub fn set_current(&self, person_id: PersonId, address_id: AddressId) -> RepoResult<()> {
        self.addresses.set_current(person_id, address_id)
    }

    pub fn retire(&self, address_id: AddressId) -> RepoResult<()> {
        self.addresses.retire(address_id)
    }

    /// Retires an address only if it belongs to `person_id`.
    pub fn retire_owned(&self, person_id: PersonId, address_id: AddressId) -> RepoResult<()> {
        match self.addresses.get_address(address_id)? {
            Some(address) if address.person_id == person_id => self.addresses.retire(address_id),
            _ => Err(RepoError::NotFound(EntityRef::AddressOfPerson {
                person_id,
                address_id,
            })),
        }
    }
}
