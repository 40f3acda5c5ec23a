//! LMDB database integrity checks.
//!
//! Run on startup to detect corruption early, before the registry accepts
//! any writes. Besides reading every database, the check verifies the two
//! catalog invariants that a torn write would break:
//! - the catalog counter equals the number of stored records;
//! - every record's tally equals the live votes stored for it.

use std::collections::HashMap;
use std::path::Path;

use tally_store::CatalogStore;
use tally_types::{Record, RecordId, Tally};

use crate::environment::LmdbEnvironment;
use crate::keys;
use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check database integrity on startup.
///
/// Read failures and invariant violations are recorded in the report rather
/// than causing a hard error.
pub fn check_integrity(env: &LmdbEnvironment) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.env.read_txn()?;
    for (name, db) in [
        ("records", &env.records_db),
        ("votes", &env.votes_db),
        ("creators", &env.creators_db),
        ("meta", &env.meta_db),
    ] {
        report.databases_checked += 1;
        match db.len(&rtxn) {
            Ok(count) => report.total_entries += count,
            Err(e) => report
                .errors
                .push(format!("failed to read database '{}': {}", name, e)),
        }
    }

    // Live vote counts per record, straight from the vote map.
    let mut live: HashMap<RecordId, Tally> = HashMap::new();
    for result in env.votes_db.iter(&rtxn)? {
        let (key, val) = result?;
        let id = keys::id_from_prefix(key)?;
        let entry = live.entry(id).or_default();
        match val {
            [1] => entry.positive += 1,
            [2] => entry.negative += 1,
            _ => report
                .errors
                .push(format!("record {}: undecodable vote value {:?}", id, val)),
        }
    }

    let mut records = 0u64;
    for result in env.records_db.iter(&rtxn)? {
        let (_, bytes) = result?;
        records += 1;
        let record: Record = match bincode::deserialize(bytes) {
            Ok(record) => record,
            Err(e) => {
                report.errors.push(format!("undecodable record: {}", e));
                continue;
            }
        };
        let expected = live.remove(&record.id).unwrap_or_default();
        if record.tally != expected {
            report.errors.push(format!(
                "record {}: tally {:?} does not match live votes {:?}",
                record.id, record.tally, expected
            ));
        }
    }
    drop(rtxn);

    for id in live.keys() {
        report
            .errors
            .push(format!("votes stored for missing record {}", id));
    }

    let counter = env.counter().map_err(|e| LmdbError::Schema(e.to_string()))?;
    if counter != records {
        report.errors.push(format!(
            "catalog counter {} does not match {} stored records",
            counter, records
        ));
    }

    Ok(report)
}

/// Check if the LMDB data directory looks valid before opening.
///
/// Returns `Ok(())` for a fresh (nonexistent) directory. Returns an error
/// if the directory exists and is non-empty but `data.mdb` is missing,
/// which suggests corruption or misconfiguration.
pub fn check_data_dir(path: &Path) -> Result<(), String> {
    if !path.exists() {
        return Ok(());
    }
    let is_empty = path
        .read_dir()
        .map(|mut entries| entries.next().is_none())
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    if is_empty {
        return Ok(());
    }
    if !path.join("data.mdb").exists() {
        return Err(format!(
            "LMDB directory exists but data.mdb is missing at {}",
            path.display()
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tally_store::{RegistryStore, StoreBatch};
    use tally_types::{AccountId, VoteCategory};

    fn record(id: u64, tally: Tally) -> Record {
        Record {
            id: RecordId::new(id),
            creator: AccountId::new("alice"),
            fields: BTreeMap::new(),
            tally,
        }
    }

    #[test]
    fn check_data_dir_fresh_path() {
        let result = check_data_dir(Path::new("/tmp/tally_test_nonexistent_12345"));
        assert!(result.is_ok());
    }

    #[test]
    fn check_data_dir_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        assert!(check_data_dir(dir.path()).is_err());
    }

    #[test]
    fn consistent_database_is_healthy() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let mut batch = StoreBatch::new();
        batch
            .put_record(record(1, Tally { positive: 1, negative: 0 }))
            .set_counter(1)
            .put_vote(RecordId::new(1), AccountId::new("bob"), VoteCategory::Positive);
        env.apply(batch).unwrap();

        let report = check_integrity(&env).unwrap();
        assert_eq!(report.databases_checked, 4);
        assert!(report.is_healthy(), "{:?}", report.errors);
    }

    #[test]
    fn tally_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let mut batch = StoreBatch::new();
        batch
            .put_record(record(1, Tally { positive: 2, negative: 0 }))
            .set_counter(1)
            .put_vote(RecordId::new(1), AccountId::new("bob"), VoteCategory::Positive);
        env.apply(batch).unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn counter_mismatch_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        let mut batch = StoreBatch::new();
        batch.set_counter(3);
        env.apply(batch).unwrap();

        let report = check_integrity(&env).unwrap();
        assert!(!report.is_healthy());
    }
}
