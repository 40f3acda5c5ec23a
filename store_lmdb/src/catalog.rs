//! LMDB implementation of CatalogStore.

use tally_store::{CatalogStore, StoreError};
use tally_types::{AccountId, Record, RecordId};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

impl CatalogStore for LmdbEnvironment {
    fn get_record(&self, id: RecordId) -> Result<Option<Record>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .records_db
            .get(&rtxn, &keys::record_key(id))
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let record: Record = bincode::deserialize(bytes).map_err(LmdbError::from)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.records_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }

    fn iter_record_ids(&self) -> Result<Vec<RecordId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for result in self.records_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (key, _) = result.map_err(LmdbError::from)?;
            ids.push(keys::id_from_prefix(key)?);
        }
        Ok(ids)
    }

    fn records_by_creator(&self, creator: &AccountId) -> Result<Vec<RecordId>, StoreError> {
        let prefix = keys::creator_prefix(creator)?;
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        let iter = self
            .creators_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        for result in iter {
            let (key, _) = result.map_err(LmdbError::from)?;
            ids.push(keys::id_from_suffix(key)?);
        }
        Ok(ids)
    }

    fn counter(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, keys::COUNTER_KEY.as_bytes())
            .map_err(LmdbError::from)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("catalog_counter has unexpected byte length".into())
                })?;
                Ok(u64::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }
}
