//! Vote storage trait.

use crate::StoreError;
use tally_types::{AccountId, RecordId, VoteCategory};

/// Read access to the per-record vote map.
pub trait VoteStore {
    /// A voter's current vote on a record. `None` means the voter never voted.
    fn get_vote(
        &self,
        record: RecordId,
        voter: &AccountId,
    ) -> Result<Option<VoteCategory>, StoreError>;

    /// Every live vote on a record.
    fn get_votes(&self, record: RecordId) -> Result<Vec<(AccountId, VoteCategory)>, StoreError>;
}
