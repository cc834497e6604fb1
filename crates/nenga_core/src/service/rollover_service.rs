//! Year rollover use-case service.
//!
//! # Invariants
//! - The service never reads the clock; callers pass the current year.
//! - The disabled-person policy is always an explicit argument or the
//!   documented default (`Exclude`).

use crate::model::nenga::{Year, YearNumber};
use crate::repo::error::RepoResult;
use crate::repo::year_repo::{CreatedYear, DisabledPersonPolicy, YearRepository};

/// Rollover and year registry facade.
pub struct RolloverService<R: YearRepository> {
    repo: R,
    policy: DisabledPersonPolicy,
}

impl<R: YearRepository> RolloverService<R> {
    /// Creates a service that excludes disabled people from rollover.
    pub fn new(repo: R) -> Self {
        Self::with_policy(repo, DisabledPersonPolicy::default())
    }

    pub fn with_policy(repo: R, policy: DisabledPersonPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn policy(&self) -> DisabledPersonPolicy {
        self.policy
    }

    /// Seeds card records for `year`.
    pub fn initialize_year(&self, year: YearNumber) -> RepoResult<CreatedYear> {
        self.repo.initialize_year(year, self.policy)
    }

    /// Seeds card records for the year after `current_year`.
    pub fn initialize_next_year(&self, current_year: YearNumber) -> RepoResult<CreatedYear> {
        self.initialize_year(current_year + 1)
    }

    pub fn get_year(&self, year: YearNumber) -> RepoResult<Option<Year>> {
        self.repo.get_year(year)
    }

    pub fn list_years(&self) -> RepoResult<Vec<Year>> {
        self.repo.list_years()
    }

    pub fn set_year_locked(&self, year: YearNumber, locked: bool) -> RepoResult<()> {
        self.repo.set_year_locked(year, locked)
    }
}
