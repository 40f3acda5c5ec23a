//! Swap-semantics vote ledger.
//!
//! Casting a vote reads the voter's previous vote on the record, then:
//! - same category: nothing changes (or the vote is rejected, per policy);
//! - otherwise: the previous bucket (if any) loses one, the new bucket gains
//!   one, and the vote map entry is overwritten.
//!
//! The vote entry and the record's new tally are written by one batch, so a
//! reader never sees one without the other.

use serde::{Deserialize, Serialize};

use crate::error::VoteError;
use tally_store::{StoreBatch, VoteStore};
use tally_types::{AccountId, Record, RecordId, Tally, VoteCategory};

/// What to do when an account re-casts the vote it already holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatVotePolicy {
    /// Silent success: no tally change, no notification.
    #[default]
    Ignore,
    /// Fail with [`VoteError::DuplicateVote`].
    Reject,
}

/// The effect of a successfully processed vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote by this account on this record.
    Cast,
    /// The account moved from `from` to the other category.
    Swapped { from: VoteCategory },
    /// The account already held this vote; nothing was written.
    Unchanged,
}

impl VoteOutcome {
    /// Whether the vote changed state (and so must be persisted and announced).
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// A planned vote: its outcome, the record's resulting tally, and the writes.
#[derive(Clone, Debug)]
pub struct PreparedVote {
    pub outcome: VoteOutcome,
    pub tally: Tally,
    /// Empty when `outcome` is [`VoteOutcome::Unchanged`].
    pub batch: StoreBatch,
}

/// Deduplicated per-account vote ledger.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoteLedger {
    policy: RepeatVotePolicy,
}

impl VoteLedger {
    pub fn new(policy: RepeatVotePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RepeatVotePolicy {
        self.policy
    }

    /// Plan `voter`'s vote on an existing record.
    ///
    /// Reads the store but never writes to it; the caller applies the batch.
    pub fn prepare_vote<S: VoteStore>(
        &self,
        store: &S,
        record: &Record,
        voter: &AccountId,
        category: VoteCategory,
    ) -> Result<PreparedVote, VoteError> {
        let previous = store.get_vote(record.id, voter)?;

        if previous == Some(category) {
            return match self.policy {
                RepeatVotePolicy::Ignore => {
                    tracing::debug!(record = %record.id, %voter, %category, "repeat vote ignored");
                    Ok(PreparedVote {
                        outcome: VoteOutcome::Unchanged,
                        tally: record.tally,
                        batch: StoreBatch::new(),
                    })
                }
                RepeatVotePolicy::Reject => Err(VoteError::DuplicateVote {
                    record: record.id.as_u64(),
                    voter: voter.to_string(),
                }),
            };
        }

        let tally = record
            .tally
            .swapped(previous, category)
            .ok_or(VoteError::TallyCorrupted(record.id.as_u64()))?;

        let mut updated = record.clone();
        updated.tally = tally;

        let mut batch = StoreBatch::new();
        batch
            .put_vote(record.id, voter.clone(), category)
            .put_record(updated);

        let outcome = match previous {
            Some(from) => VoteOutcome::Swapped { from },
            None => VoteOutcome::Cast,
        };
        Ok(PreparedVote {
            outcome,
            tally,
            batch,
        })
    }

    /// Strict positive majority on a record. Ties are not a majority.
    pub fn has_majority_positive(&self, record: &Record) -> bool {
        record.tally.has_majority_positive()
    }

    /// Recompute a record's tally from its vote map.
    pub fn recount<S: VoteStore>(&self, store: &S, record: RecordId) -> Result<Tally, VoteError> {
        let mut tally = Tally::ZERO;
        for (_, category) in store.get_votes(record)? {
            tally = tally
                .swapped(None, category)
                .ok_or(VoteError::TallyCorrupted(record.as_u64()))?;
        }
        Ok(tally)
    }

    /// Whether the stored tally of `record` matches its vote map.
    pub fn verify<S: VoteStore>(&self, store: &S, record: &Record) -> Result<bool, VoteError> {
        Ok(self.recount(store, record.id)? == record.tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tally_nullables::NullStore;
    use tally_store::{CatalogStore, RegistryStore};

    fn voter(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn seed_record(store: &NullStore) -> Record {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "Test".to_string());
        let record = Record {
            id: RecordId::new(1),
            creator: voter("creator"),
            fields,
            tally: Tally::ZERO,
        };
        let mut batch = StoreBatch::new();
        batch.put_record(record.clone()).set_counter(1);
        store.apply(batch).unwrap();
        record
    }

    /// Plan and apply a vote, returning the outcome.
    fn vote(
        ledger: &VoteLedger,
        store: &NullStore,
        who: &str,
        category: VoteCategory,
    ) -> Result<VoteOutcome, VoteError> {
        let record = store.get_record(RecordId::new(1)).unwrap().unwrap();
        let prepared = ledger.prepare_vote(store, &record, &voter(who), category)?;
        store.apply(prepared.batch).unwrap();
        Ok(prepared.outcome)
    }

    fn tally(store: &NullStore) -> Tally {
        store.get_record(RecordId::new(1)).unwrap().unwrap().tally
    }

    #[test]
    fn test_first_vote_is_cast() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::default();
        let outcome = vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();
        assert_eq!(outcome, VoteOutcome::Cast);
        assert_eq!(tally(&store), Tally { positive: 1, negative: 0 });
        assert_eq!(
            store.get_vote(RecordId::new(1), &voter("a")).unwrap(),
            Some(VoteCategory::Positive)
        );
    }

    #[test]
    fn test_positive_then_negative_swaps() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::default();
        vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();
        let outcome = vote(&ledger, &store, "a", VoteCategory::Negative).unwrap();
        assert_eq!(
            outcome,
            VoteOutcome::Swapped {
                from: VoteCategory::Positive
            }
        );
        assert_eq!(tally(&store), Tally { positive: 0, negative: 1 });
    }

    #[test]
    fn test_negative_then_positive_swaps() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::default();
        vote(&ledger, &store, "a", VoteCategory::Negative).unwrap();
        vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();
        assert_eq!(tally(&store), Tally { positive: 1, negative: 0 });
    }

    #[test]
    fn test_repeat_vote_ignored() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::new(RepeatVotePolicy::Ignore);
        vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();

        let record = store.get_record(RecordId::new(1)).unwrap().unwrap();
        let prepared = ledger
            .prepare_vote(&store, &record, &voter("a"), VoteCategory::Positive)
            .unwrap();
        assert_eq!(prepared.outcome, VoteOutcome::Unchanged);
        assert!(!prepared.outcome.changed());
        assert!(prepared.batch.is_empty());
        assert_eq!(prepared.tally, Tally { positive: 1, negative: 0 });
    }

    #[test]
    fn test_repeat_vote_rejected() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::new(RepeatVotePolicy::Reject);
        vote(&ledger, &store, "a", VoteCategory::Negative).unwrap();
        let err = vote(&ledger, &store, "a", VoteCategory::Negative).unwrap_err();
        assert!(matches!(err, VoteError::DuplicateVote { record: 1, .. }));
        assert_eq!(tally(&store), Tally { positive: 0, negative: 1 });
    }

    #[test]
    fn test_corrupted_tally_detected() {
        let store = NullStore::new();
        let mut record = seed_record(&store);
        let ledger = VoteLedger::default();
        vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();

        // Stale copy with a zero tally: decrementing positive must fail.
        record.tally = Tally::ZERO;
        let err = ledger
            .prepare_vote(&store, &record, &voter("a"), VoteCategory::Negative)
            .unwrap_err();
        assert!(matches!(err, VoteError::TallyCorrupted(1)));
    }

    #[test]
    fn test_recount_matches_tally() {
        let store = NullStore::new();
        seed_record(&store);
        let ledger = VoteLedger::default();
        vote(&ledger, &store, "a", VoteCategory::Positive).unwrap();
        vote(&ledger, &store, "b", VoteCategory::Negative).unwrap();
        vote(&ledger, &store, "a", VoteCategory::Negative).unwrap();

        let record = store.get_record(RecordId::new(1)).unwrap().unwrap();
        assert_eq!(
            ledger.recount(&store, record.id).unwrap(),
            Tally { positive: 0, negative: 2 }
        );
        assert!(ledger.verify(&store, &record).unwrap());
        assert!(!ledger.has_majority_positive(&record));
    }
}
