//! Atomic write batches.
//!
//! A batch is an ordered list of writes produced by the catalog or the vote
//! ledger for one operation. Backends apply it in order inside a single
//! transaction.

use tally_types::{AccountId, Record, RecordId, VoteCategory};

/// A single write inside a [`StoreBatch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert a record, or overwrite it to update its tally.
    PutRecord(Record),
    /// Append a record id to a creator's submission index.
    IndexCreator { creator: AccountId, id: RecordId },
    /// Store the new catalog counter value.
    SetCounter(u64),
    /// Insert or overwrite a voter's vote on a record.
    PutVote {
        record: RecordId,
        voter: AccountId,
        category: VoteCategory,
    },
}

/// An ordered group of writes applied all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreBatch {
    ops: Vec<BatchOp>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn put_record(&mut self, record: Record) -> &mut Self {
        self.ops.push(BatchOp::PutRecord(record));
        self
    }

    pub fn index_creator(&mut self, creator: AccountId, id: RecordId) -> &mut Self {
        self.ops.push(BatchOp::IndexCreator { creator, id });
        self
    }

    pub fn set_counter(&mut self, counter: u64) -> &mut Self {
        self.ops.push(BatchOp::SetCounter(counter));
        self
    }

    pub fn put_vote(
        &mut self,
        record: RecordId,
        voter: AccountId,
        category: VoteCategory,
    ) -> &mut Self {
        self.ops.push(BatchOp::PutVote {
            record,
            voter,
            category,
        });
        self
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
