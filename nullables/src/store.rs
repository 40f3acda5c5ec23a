//! Nullable store: thread-safe in-memory storage for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use tally_store::{
    BatchOp, CatalogStore, MetaStore, RegistryStore, StoreBatch, StoreError, VoteStore,
};
use tally_types::{AccountId, Record, RecordId, VoteCategory};

const SCHEMA_VERSION_KEY: &str = "schema_version";

#[derive(Default)]
struct State {
    records: BTreeMap<RecordId, Record>,
    creators: HashMap<AccountId, Vec<RecordId>>,
    votes: BTreeMap<(RecordId, AccountId), VoteCategory>,
    counter: u64,
    meta: HashMap<String, Vec<u8>>,
    fail_next_apply: Option<String>,
    applied_batches: u64,
}

/// An in-memory registry store for testing.
///
/// All state sits behind one mutex, so a batch is applied atomically with
/// respect to every reader.
pub struct NullStore {
    state: Mutex<State>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Make the next [`RegistryStore::apply`] fail with a backend error
    /// without writing anything.
    pub fn fail_next_apply(&self, reason: impl Into<String>) {
        self.state.lock().unwrap().fail_next_apply = Some(reason.into());
    }

    /// Number of batches applied so far.
    pub fn applied_batches(&self) -> u64 {
        self.state.lock().unwrap().applied_batches
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogStore for NullStore {
    fn get_record(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.state.lock().unwrap().records.get(&id).cloned())
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().records.len() as u64)
    }

    fn iter_record_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        Ok(self.state.lock().unwrap().records.keys().copied().collect())
    }

    fn records_by_creator(&self, creator: &AccountId) -> Result<Vec<RecordId>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .creators
            .get(creator)
            .cloned()
            .unwrap_or_default())
    }

    fn counter(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().counter)
    }
}

impl VoteStore for NullStore {
    fn get_vote(
        &self,
        record: RecordId,
        voter: &AccountId,
    ) -> Result<Option<VoteCategory>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .votes
            .get(&(record, voter.clone()))
            .copied())
    }

    fn get_votes(&self, record: RecordId) -> Result<Vec<(AccountId, VoteCategory)>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .votes
            .range((record, AccountId::new(""))..)
            .take_while(|((id, _), _)| *id == record)
            .map(|((_, voter), category)| (voter.clone(), *category))
            .collect())
    }
}

impl MetaStore for NullStore {
    fn put_meta(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.state
            .lock()
            .unwrap()
            .meta
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.state.lock().unwrap().meta.get(key).cloned())
    }

    fn get_schema_version(&self) -> Result<u32, StoreError> {
        match self.get_meta(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.as_slice().try_into().map_err(|_| {
                    StoreError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    fn set_schema_version(&self, version: u32) -> Result<(), StoreError> {
        self.put_meta(SCHEMA_VERSION_KEY, &version.to_le_bytes())
    }
}

impl RegistryStore for NullStore {
    fn apply(&self, batch: StoreBatch) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.fail_next_apply.take() {
            return Err(StoreError::Backend(reason));
        }
        for op in batch.into_ops() {
            match op {
                BatchOp::PutRecord(record) => {
                    state.records.insert(record.id, record);
                }
                BatchOp::IndexCreator { creator, id } => {
                    state.creators.entry(creator).or_default().push(id);
                }
                BatchOp::SetCounter(counter) => {
                    state.counter = counter;
                }
                BatchOp::PutVote {
                    record,
                    voter,
                    category,
                } => {
                    state.votes.insert((record, voter), category);
                }
            }
        }
        state.applied_batches += 1;
        Ok(())
    }
}
