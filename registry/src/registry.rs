//! The registry facade: one lock, one batch and one notification per change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tally_catalog::{Catalog, IdBase, RecordSchema};
use tally_store::{RegistryStore, StoreError};
use tally_store_lmdb::integrity::check_integrity;
use tally_store_lmdb::{LmdbEnvironment, Migrator};
use tally_types::{AccountId, Record, RecordId, Tally, VoteCategory};
use tally_votes::{VoteLedger, VoteOutcome};

use crate::config::RegistryConfig;
use crate::events::{EventBus, NotificationSink, RegistryEvent};
use crate::RegistryError;

/// Meta key under which the deployment's id base and schema are pinned.
const POLICY_KEY: &str = "catalog_policy";

/// Record catalog plus vote ledger over one store.
///
/// Every state-changing call takes the write lock, plans its writes against
/// the store, applies them as one [`tally_store::StoreBatch`] and only then
/// notifies subscribers. A failure at any step leaves the store untouched
/// and emits nothing.
pub struct Registry<S: RegistryStore> {
    store: S,
    catalog: Catalog,
    ledger: VoteLedger,
    events: EventBus,
    write_lock: Mutex<()>,
}

impl<S: RegistryStore> Registry<S> {
    pub fn new(store: S, config: &RegistryConfig) -> Result<Self, RegistryError> {
        let schema = config.schema.resolve()?;
        let catalog = Catalog::new(schema, config.catalog_policy())?;
        pin_policy(&store, &catalog)?;

        tracing::info!(
            schema = %catalog.schema().name,
            id_base = catalog.policy().id_base.name(),
            repeat_vote = ?config.repeat_vote,
            single_submission = config.single_submission,
            "registry ready"
        );

        Ok(Self {
            store,
            catalog,
            ledger: VoteLedger::new(config.repeat_vote),
            events: EventBus::new(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Release the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    pub fn schema(&self) -> &RecordSchema {
        self.catalog.schema()
    }

    /// Register a listener. Listeners run inline under the write lock.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&RegistryEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn subscribe_sink(&mut self, sink: Arc<dyn NotificationSink>) {
        self.events.subscribe(Box::new(move |event| sink.notify(event)));
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, RegistryError> {
        self.write_lock
            .lock()
            .map_err(|_| RegistryError::LockPoisoned)
    }

    fn check_account(account: &AccountId, action: &str) -> Result<(), RegistryError> {
        account.check_len().map_err(|e| {
            tracing::warn!(len = account.as_bytes().len(), action, error = %e, "account rejected");
            RegistryError::from(e)
        })
    }

    // ── Catalog ────────────────────────────────────────────────────────

    /// Validate and catalogue a record, returning its new id.
    pub fn insert(
        &self,
        creator: &AccountId,
        fields: &BTreeMap<String, String>,
    ) -> Result<RecordId, RegistryError> {
        Self::check_account(creator, "insert")?;
        let _guard = self.lock()?;

        let prepared = match self.catalog.prepare_insert(&self.store, creator, fields) {
            Ok(prepared) => prepared,
            Err(e) => {
                let err = RegistryError::from(e);
                if err.is_rejection() {
                    tracing::warn!(%creator, error = %err, "record rejected");
                }
                return Err(err);
            }
        };

        self.store.apply(prepared.batch)?;

        let record = prepared.record;
        let title = self.catalog.title_of(&record).to_string();
        tracing::info!(id = %record.id, %creator, %title, "record created");
        self.events.emit(&RegistryEvent::RecordCreated {
            id: record.id,
            title,
            creator: record.creator,
        });
        Ok(record.id)
    }

    pub fn get(&self, id: RecordId) -> Result<Record, RegistryError> {
        Ok(self.catalog.get(&self.store, id)?)
    }

    /// Every assigned id, ascending.
    pub fn all_ids(&self) -> Result<Vec<RecordId>, RegistryError> {
        let _guard = self.lock()?;
        Ok(self.catalog.all_ids(&self.store)?)
    }

    /// A creator's records in submission order.
    pub fn records_by_creator(&self, creator: &AccountId) -> Result<Vec<RecordId>, RegistryError> {
        Self::check_account(creator, "records_by_creator")?;
        let _guard = self.lock()?;
        Ok(self.catalog.records_by_creator(&self.store, creator)?)
    }

    pub fn record_count(&self) -> Result<u64, RegistryError> {
        Ok(self.catalog.record_count(&self.store)?)
    }

    /// The id the next successful insert will receive.
    pub fn next_id(&self) -> Result<RecordId, RegistryError> {
        Ok(self.catalog.next_id(&self.store)?)
    }

    // ── Votes ──────────────────────────────────────────────────────────

    /// Record `voter`'s vote on `record_id` with swap semantics.
    pub fn cast_vote(
        &self,
        record_id: RecordId,
        voter: &AccountId,
        category: VoteCategory,
    ) -> Result<VoteOutcome, RegistryError> {
        Self::check_account(voter, "cast_vote")?;
        let _guard = self.lock()?;

        let record = self.get(record_id).map_err(|e| {
            if e.is_rejection() {
                tracing::warn!(record = %record_id, %voter, error = %e, "vote rejected");
            }
            e
        })?;

        let prepared = match self.ledger.prepare_vote(&self.store, &record, voter, category) {
            Ok(prepared) => prepared,
            Err(e) => {
                let err = RegistryError::from(e);
                if err.is_rejection() {
                    tracing::warn!(record = %record_id, %voter, error = %err, "vote rejected");
                }
                return Err(err);
            }
        };

        if !prepared.outcome.changed() {
            return Ok(prepared.outcome);
        }

        self.store.apply(prepared.batch)?;

        tracing::info!(
            record = %record_id,
            %voter,
            %category,
            positive = prepared.tally.positive,
            negative = prepared.tally.negative,
            "vote cast"
        );
        self.events.emit(&RegistryEvent::VoteCast {
            record_id,
            voter: voter.clone(),
            category,
        });
        Ok(prepared.outcome)
    }

    /// [`Registry::cast_vote`] for a raw category code (1 positive, 2 negative).
    ///
    /// An unknown record is reported before an invalid code.
    pub fn cast_vote_code(
        &self,
        record_id: RecordId,
        voter: &AccountId,
        code: u8,
    ) -> Result<VoteOutcome, RegistryError> {
        self.get(record_id)?;
        let category = VoteCategory::from_code(code).map_err(|e| {
            tracing::warn!(record = %record_id, %voter, code, "vote rejected: invalid category");
            RegistryError::from(e)
        })?;
        self.cast_vote(record_id, voter, category)
    }

    /// The live vote of `voter` on `record_id`, `None` if they never voted.
    pub fn vote_of(
        &self,
        record_id: RecordId,
        voter: &AccountId,
    ) -> Result<Option<VoteCategory>, RegistryError> {
        Self::check_account(voter, "vote_of")?;
        self.get(record_id)?;
        Ok(self.store.get_vote(record_id, voter)?)
    }

    /// Every live vote on `record_id`, ordered by voter.
    pub fn votes(
        &self,
        record_id: RecordId,
    ) -> Result<Vec<(AccountId, VoteCategory)>, RegistryError> {
        let _guard = self.lock()?;
        self.get(record_id)?;
        Ok(self.store.get_votes(record_id)?)
    }

    pub fn tally(&self, record_id: RecordId) -> Result<Tally, RegistryError> {
        Ok(self.get(record_id)?.tally)
    }

    /// Strictly more positive than negative votes. Ties, including 0/0, are not.
    pub fn has_majority_positive(&self, record_id: RecordId) -> Result<bool, RegistryError> {
        let record = self.get(record_id)?;
        Ok(self.ledger.has_majority_positive(&record))
    }

    /// Whether the stored tally of `record_id` equals a recount of its votes.
    pub fn verify_tally(&self, record_id: RecordId) -> Result<bool, RegistryError> {
        let _guard = self.lock()?;
        let record = self.get(record_id)?;
        Ok(self.ledger.verify(&self.store, &record)?)
    }
}

impl Registry<LmdbEnvironment> {
    /// Open the durable LMDB backend at `config.data_dir`.
    ///
    /// Runs schema migrations and an integrity check before accepting writes.
    pub fn open_lmdb(config: &RegistryConfig) -> Result<Self, RegistryError> {
        let env = LmdbEnvironment::open(&config.data_dir, config.map_size_bytes())?;
        Migrator::run(&env)?;

        let report = check_integrity(&env)?;
        if !report.is_healthy() {
            for error in &report.errors {
                tracing::error!(%error, "integrity check failed");
            }
            return Err(RegistryError::Store(StoreError::Corruption(format!(
                "{} integrity error(s) in {}",
                report.errors.len(),
                config.data_dir.display()
            ))));
        }
        tracing::debug!(
            databases = report.databases_checked,
            entries = report.total_entries,
            "integrity check passed"
        );

        Self::new(env, config)
    }
}

/// The catalog settings a store is bound to on first use.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct PinnedPolicy {
    id_base: IdBase,
    schema: RecordSchema,
}

/// Record the catalog's id base and full schema on first use and refuse a
/// store that was written under different ones.
fn pin_policy<S: RegistryStore>(store: &S, catalog: &Catalog) -> Result<(), RegistryError> {
    let expected = PinnedPolicy {
        id_base: catalog.policy().id_base,
        schema: catalog.schema().clone(),
    };
    let Some(stored) = store.get_meta(POLICY_KEY)? else {
        let encoded = toml::to_string(&expected)
            .map_err(|e| RegistryError::Config(format!("cannot encode catalog policy: {}", e)))?;
        store.put_meta(POLICY_KEY, encoded.as_bytes())?;
        return Ok(());
    };

    let pinned: PinnedPolicy = std::str::from_utf8(&stored)
        .map_err(|e| e.to_string())
        .and_then(|text| toml::from_str(text).map_err(|e| e.to_string()))
        .map_err(|e| {
            RegistryError::Store(StoreError::Corruption(format!(
                "unreadable pinned catalog policy: {}",
                e
            )))
        })?;

    if pinned.id_base != expected.id_base {
        return Err(RegistryError::Config(format!(
            "store was created with id base '{}', configured '{}'",
            pinned.id_base.name(),
            expected.id_base.name()
        )));
    }
    if pinned.schema != expected.schema {
        return Err(RegistryError::Config(format!(
            "store was created with schema '{}' ({} fields), configured schema '{}' differs",
            pinned.schema.name,
            pinned.schema.fields.len(),
            expected.schema.name
        )));
    }
    Ok(())
}
