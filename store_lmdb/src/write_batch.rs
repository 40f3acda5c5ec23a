//! Write batching: applies a [`StoreBatch`] inside a single LMDB write
//! transaction.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = env.write_batch()?;
//! batch.put_record(&record)?;
//! batch.set_counter(1)?;
//! batch.commit()?;
//! ```
//!
//! If the batch is dropped without calling [`WriteBatch::commit`], all
//! operations are rolled back (the underlying LMDB transaction is aborted).

use heed::RwTxn;

use tally_store::{BatchOp, RegistryStore, StoreBatch, StoreError};
use tally_types::{AccountId, Record, RecordId, VoteCategory};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

/// A group of writes sharing one LMDB write transaction.
pub struct WriteBatch<'a> {
    txn: RwTxn<'a>,
    env: &'a LmdbEnvironment,
}

impl<'a> WriteBatch<'a> {
    /// Begin a new write batch.
    pub(crate) fn new(env: &'a LmdbEnvironment) -> Result<Self, LmdbError> {
        let txn = env.env.write_txn()?;
        Ok(Self { txn, env })
    }

    /// Insert or overwrite a record.
    pub fn put_record(&mut self, record: &Record) -> Result<(), LmdbError> {
        let bytes = bincode::serialize(record)?;
        self.env
            .records_db
            .put(&mut self.txn, &keys::record_key(record.id), &bytes)?;
        Ok(())
    }

    /// Append a record to its creator's index.
    pub fn index_creator(&mut self, creator: &AccountId, id: RecordId) -> Result<(), LmdbError> {
        let key = keys::creator_key(creator, id)?;
        self.env.creators_db.put(&mut self.txn, &key, &[])?;
        Ok(())
    }

    /// Store the catalog counter.
    pub fn set_counter(&mut self, counter: u64) -> Result<(), LmdbError> {
        self.env.meta_db.put(
            &mut self.txn,
            keys::COUNTER_KEY.as_bytes(),
            &counter.to_le_bytes(),
        )?;
        Ok(())
    }

    /// Insert or overwrite a vote.
    pub fn put_vote(
        &mut self,
        record: RecordId,
        voter: &AccountId,
        category: VoteCategory,
    ) -> Result<(), LmdbError> {
        let key = keys::vote_key(record, voter)?;
        self.env
            .votes_db
            .put(&mut self.txn, &key, &[category.code()])?;
        Ok(())
    }

    /// Apply one abstract batch operation.
    pub fn apply_op(&mut self, op: &BatchOp) -> Result<(), LmdbError> {
        match op {
            BatchOp::PutRecord(record) => self.put_record(record),
            BatchOp::IndexCreator { creator, id } => self.index_creator(creator, *id),
            BatchOp::SetCounter(counter) => self.set_counter(*counter),
            BatchOp::PutVote {
                record,
                voter,
                category,
            } => self.put_vote(*record, voter, *category),
        }
    }

    /// Commit all writes atomically.
    pub fn commit(self) -> Result<(), LmdbError> {
        self.txn.commit()?;
        Ok(())
    }
}

impl RegistryStore for LmdbEnvironment {
    fn apply(&self, batch: StoreBatch) -> Result<(), StoreError> {
        let mut wb = self.write_batch()?;
        for op in batch.ops() {
            wb.apply_op(op)?;
        }
        wb.commit()?;
        tracing::trace!(ops = batch.len(), "applied store batch");
        Ok(())
    }
}
