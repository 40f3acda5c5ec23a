//! The record catalog: identifier assignment, insertion planning and lookups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CatalogError;
use crate::schema::RecordSchema;
use crate::validation::validate_fields;
use tally_store::{CatalogStore, StoreBatch, StoreError};
use tally_types::{AccountId, Record, RecordId, Tally};

/// How identifiers are derived from the catalog counter.
///
/// The counter always starts at 0 and always equals the number of records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdBase {
    /// Use-then-increment: ids 0, 1, 2, ...
    Zero,
    /// Pre-increment: ids 1, 2, 3, ...
    #[default]
    One,
}

impl IdBase {
    pub fn first_id(&self) -> RecordId {
        match self {
            Self::Zero => RecordId::new(0),
            Self::One => RecordId::new(1),
        }
    }

    /// The id the next insertion receives given the current counter.
    pub fn next_id(&self, counter: u64) -> Option<RecordId> {
        match self {
            Self::Zero => Some(RecordId::new(counter)),
            Self::One => counter.checked_add(1).map(RecordId::new),
        }
    }

    /// The id for an insertion and the counter value after it.
    pub fn assign(&self, counter: u64) -> Option<(RecordId, u64)> {
        let next_counter = counter.checked_add(1)?;
        let id = self.next_id(counter)?;
        Some((id, next_counter))
    }

    /// Whether `id` has been handed out by a catalog at `counter`.
    pub fn is_assigned(&self, id: RecordId, counter: u64) -> bool {
        let id = id.as_u64();
        match self {
            Self::Zero => id < counter,
            Self::One => id >= 1 && id <= counter,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
        }
    }
}

/// Per-deployment catalog policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPolicy {
    pub id_base: IdBase,
    /// At most one record per creator.
    pub single_submission: bool,
}

/// A validated record and the writes that persist it.
#[derive(Clone, Debug)]
pub struct PreparedInsert {
    pub record: Record,
    pub batch: StoreBatch,
}

/// Append-only record catalog over any [`CatalogStore`].
#[derive(Clone, Debug)]
pub struct Catalog {
    schema: RecordSchema,
    policy: CatalogPolicy,
}

impl Catalog {
    pub fn new(schema: RecordSchema, policy: CatalogPolicy) -> Result<Self, CatalogError> {
        schema.check_definition()?;
        Ok(Self { schema, policy })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn policy(&self) -> &CatalogPolicy {
        &self.policy
    }

    /// Validate a submission and plan its insertion.
    ///
    /// Reads the store but never writes to it. The returned batch stores the
    /// record with a zero tally, indexes it under its creator and advances
    /// the counter; the caller must apply it before planning another insert.
    pub fn prepare_insert<S: CatalogStore>(
        &self,
        store: &S,
        creator: &AccountId,
        fields: &BTreeMap<String, String>,
    ) -> Result<PreparedInsert, CatalogError> {
        let fields = validate_fields(&self.schema.fields, fields)?;

        if self.policy.single_submission && store.has_submitted(creator)? {
            return Err(CatalogError::DuplicateSubmission(creator.to_string()));
        }

        let counter = store.counter()?;
        let (id, next_counter) = self
            .policy
            .id_base
            .assign(counter)
            .ok_or(CatalogError::CounterExhausted(counter))?;

        let record = Record {
            id,
            creator: creator.clone(),
            fields,
            tally: Tally::ZERO,
        };

        let mut batch = StoreBatch::new();
        batch
            .put_record(record.clone())
            .index_creator(creator.clone(), id)
            .set_counter(next_counter);

        tracing::trace!(%id, %creator, schema = %self.schema.name, "prepared record insert");
        Ok(PreparedInsert { record, batch })
    }

    /// Point lookup. `NotFound` for any id the counter has not reached.
    pub fn get<S: CatalogStore>(&self, store: &S, id: RecordId) -> Result<Record, CatalogError> {
        let counter = store.counter()?;
        if !self.policy.id_base.is_assigned(id, counter) {
            return Err(CatalogError::NotFound(id.as_u64()));
        }
        store.get_record(id)?.ok_or_else(|| {
            CatalogError::Store(StoreError::Corruption(format!(
                "record {} missing below counter {}",
                id, counter
            )))
        })
    }

    /// The id the next successful insert will receive.
    pub fn next_id<S: CatalogStore>(&self, store: &S) -> Result<RecordId, CatalogError> {
        let counter = store.counter()?;
        self.policy
            .id_base
            .next_id(counter)
            .ok_or(CatalogError::CounterExhausted(counter))
    }

    pub fn record_count<S: CatalogStore>(&self, store: &S) -> Result<u64, CatalogError> {
        Ok(store.counter()?)
    }

    /// Every assigned id, ascending. O(n) in the catalog size.
    pub fn all_ids<S: CatalogStore>(&self, store: &S) -> Result<Vec<RecordId>, CatalogError> {
        Ok(store.iter_record_ids()?)
    }

    /// A creator's records in submission order. O(k) in that creator's records.
    pub fn records_by_creator<S: CatalogStore>(
        &self,
        store: &S,
        creator: &AccountId,
    ) -> Result<Vec<RecordId>, CatalogError> {
        Ok(store.records_by_creator(creator)?)
    }

    /// The human-readable name of a record under this catalog's schema.
    pub fn title_of<'a>(&self, record: &'a Record) -> &'a str {
        self.schema.title_of(record)
    }
}
