//! Duplicate detection across the run's in-flight values and the persisted store.
//!
//! [`DuplicateOracle`] answers whether a value is already persisted. Two
//! strategies exist: [`MemoryOracle`] snapshots the store up front (eager),
//! [`StoreOracle`] asks the store per candidate (lazy). [`Universe`] merges
//! either with the values accepted during the current run.

use std::collections::HashSet;

use crate::errors::GenError;
use crate::store::{PersistedValues, Store};
use crate::types::{Candidate, TaxId};

pub trait DuplicateOracle: Send {
    /// Whether `candidate` already exists among persisted records.
    fn is_persisted(&self, candidate: Candidate<'_>) -> Result<bool, GenError>;
}

/// Eager strategy: every persisted value lives in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryOracle {
    persisted: PersistedValues,
}

impl MemoryOracle {
    pub fn new(persisted: PersistedValues) -> Self {
        Self { persisted }
    }

    /// Snapshot the store. Records written afterwards are not visible here.
    pub fn load(store: &Store) -> Result<Self, GenError> {
        Ok(Self::new(store.persisted_values()?))
    }
}

impl DuplicateOracle for MemoryOracle {
    fn is_persisted(&self, candidate: Candidate<'_>) -> Result<bool, GenError> {
        Ok(match candidate {
            Candidate::TaxId(id) => self.persisted.tax_ids.contains(&id),
            Candidate::PassNumber(p) => self.persisted.pass_numbers.contains(p),
            Candidate::Email(e) => self.persisted.emails.contains(e),
        })
    }
}

/// Lazy strategy: one count query per candidate.
#[derive(Debug, Clone)]
pub struct StoreOracle {
    store: Store,
}

impl StoreOracle {
    pub fn new(store: Store) -> Self {
        Self { store }
    }
}

impl DuplicateOracle for StoreOracle {
    fn is_persisted(&self, candidate: Candidate<'_>) -> Result<bool, GenError> {
        Ok(self.store.count_matching(candidate)? > 0)
    }
}

/// Values accepted during the current run. Grows monotonically.
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    pub tax_ids: HashSet<TaxId>,
    pub pass_numbers: HashSet<String>,
    pub emails: HashSet<String>,
}

impl InFlight {
    pub fn contains(&self, candidate: Candidate<'_>) -> bool {
        match candidate {
            Candidate::TaxId(id) => self.tax_ids.contains(&id),
            Candidate::PassNumber(p) => self.pass_numbers.contains(p),
            Candidate::Email(e) => self.emails.contains(e),
        }
    }

    fn insert(&mut self, candidate: Candidate<'_>) -> bool {
        match candidate {
            Candidate::TaxId(id) => self.tax_ids.insert(id),
            Candidate::PassNumber(p) => self.pass_numbers.insert(p.to_owned()),
            Candidate::Email(e) => self.emails.insert(e.to_owned()),
        }
    }
}

/// The full set of used values: in-flight plus whatever the oracle reports.
pub struct Universe {
    oracle: Box<dyn DuplicateOracle>,
    in_flight: InFlight,
}

impl std::fmt::Debug for Universe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Universe")
            .field("tax_ids", &self.in_flight.tax_ids.len())
            .field("pass_numbers", &self.in_flight.pass_numbers.len())
            .field("emails", &self.in_flight.emails.len())
            .finish()
    }
}

impl Universe {
    pub fn new(oracle: Box<dyn DuplicateOracle>) -> Self {
        Self { oracle, in_flight: InFlight::default() }
    }

    /// Eager or lazy universe over `store`, chosen once per run.
    ///
    /// The eager snapshot is only read when the table existed before this run.
    pub fn for_store(store: &Store, in_memory: bool, table_existed: bool) -> Result<Self, GenError> {
        let oracle: Box<dyn DuplicateOracle> = match (in_memory, table_existed) {
            (true, true) => Box::new(MemoryOracle::load(store)?),
            (true, false) => Box::new(MemoryOracle::default()),
            (false, _) => Box::new(StoreOracle::new(store.clone())),
        };
        Ok(Self::new(oracle))
    }

    /// In-flight values are checked first; the oracle only sees misses.
    pub fn is_used(&self, candidate: Candidate<'_>) -> Result<bool, GenError> {
        if self.in_flight.contains(candidate) {
            return Ok(true);
        }
        self.oracle.is_persisted(candidate)
    }

    /// Accept `candidate` if unused. Returns whether it was accepted.
    pub fn try_accept(&mut self, candidate: Candidate<'_>) -> Result<bool, GenError> {
        if self.is_used(candidate)? {
            return Ok(false);
        }
        Ok(self.in_flight.insert(candidate))
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }
}
