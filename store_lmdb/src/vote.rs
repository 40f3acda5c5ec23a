//! LMDB implementation of VoteStore.

use tally_store::{StoreError, VoteStore};
use tally_types::{AccountId, RecordId, VoteCategory};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

fn decode_category(bytes: &[u8]) -> Result<VoteCategory, LmdbError> {
    match bytes {
        [code] => VoteCategory::from_code(*code)
            .map_err(|e| LmdbError::Serialization(e.to_string())),
        _ => Err(LmdbError::Serialization(
            "vote value has unexpected byte length".into(),
        )),
    }
}

impl VoteStore for LmdbEnvironment {
    fn get_vote(
        &self,
        record: RecordId,
        voter: &AccountId,
    ) -> Result<Option<VoteCategory>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let key = keys::vote_key(record, voter)?;
        match self.votes_db.get(&rtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => Ok(Some(decode_category(bytes)?)),
            None => Ok(None),
        }
    }

    fn get_votes(&self, record: RecordId) -> Result<Vec<(AccountId, VoteCategory)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = keys::vote_prefix(record);
        let iter = self
            .votes_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut votes = Vec::new();
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            votes.push((keys::voter_from_vote_key(key)?, decode_category(val)?));
        }
        Ok(votes)
    }
}
