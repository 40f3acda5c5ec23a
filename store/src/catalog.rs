//! Catalog storage trait.

use crate::StoreError;
use tally_types::{AccountId, Record, RecordId};

/// Read access to the record catalog.
pub trait CatalogStore {
    /// Get a record by id. `None` if no record was ever stored under it.
    fn get_record(&self, id: RecordId) -> Result<Option<Record>, StoreError>;

    /// Number of stored records.
    fn record_count(&self) -> Result<u64, StoreError>;

    /// All record ids in ascending order. O(n), unpaginated.
    fn iter_record_ids(&self) -> Result<Vec<RecordId>, StoreError>;

    /// Ids of the records submitted by `creator`, in submission order.
    fn records_by_creator(&self, creator: &AccountId) -> Result<Vec<RecordId>, StoreError>;

    /// Current value of the catalog counter (0 for a fresh catalog).
    fn counter(&self) -> Result<u64, StoreError>;

    /// Whether `creator` has submitted at least one record.
    fn has_submitted(&self, creator: &AccountId) -> Result<bool, StoreError> {
        self.records_by_creator(creator).map(|ids| !ids.is_empty())
    }
}
