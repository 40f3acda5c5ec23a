//! Integration tests exercising the full registry pipeline:
//! submission → validation → catalogue → votes → persistence → readback.
//!
//! The in-memory store covers the behavioural scenarios; the LMDB tests
//! check that the same state survives closing and reopening the database.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

use tally_nullables::NullStore;
use tally_registry::{
    AccountId, EventLog, FieldRule, IdBase, RecordId, RecordSchema, Registry, RegistryConfig,
    RegistryError, RegistryEvent, RepeatVotePolicy, SchemaConfig, Tally, VoteCategory,
    VoteOutcome,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn content(title: &str) -> BTreeMap<String, String> {
    let mut f = BTreeMap::new();
    f.insert("title".to_string(), title.to_string());
    f.insert("description".to_string(), "Lesson notes".to_string());
    f.insert("url".to_string(), "https://example.org/lesson".to_string());
    f.insert("content_type".to_string(), "video".to_string());
    f
}

fn account(name: &str) -> AccountId {
    AccountId::new(name)
}

fn null_registry(config: &RegistryConfig) -> (Registry<NullStore>, Arc<EventLog>) {
    let mut registry = Registry::new(NullStore::new(), config).expect("registry");
    let log = Arc::new(EventLog::new());
    registry.subscribe_sink(log.clone());
    (registry, log)
}

fn lmdb_config(dir: &tempfile::TempDir) -> RegistryConfig {
    RegistryConfig {
        data_dir: dir.path().join("registry"),
        map_size_mb: 16,
        ..RegistryConfig::default()
    }
}

// ---------------------------------------------------------------------------
// 1. Catalog scenarios
// ---------------------------------------------------------------------------

#[test]
fn swap_scenario_on_first_record() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    let creator = account("creator");
    let a = account("a");
    let b = account("b");

    let id = registry.insert(&creator, &content("Test")).unwrap();
    assert_eq!(id, RecordId::new(1));

    registry.cast_vote(id, &a, VoteCategory::Positive).unwrap();
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 1, negative: 0 });

    let outcome = registry.cast_vote(id, &a, VoteCategory::Negative).unwrap();
    assert_eq!(
        outcome,
        VoteOutcome::Swapped {
            from: VoteCategory::Positive
        }
    );
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 0, negative: 1 });

    registry.cast_vote(id, &b, VoteCategory::Negative).unwrap();
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 0, negative: 2 });
    assert!(!registry.has_majority_positive(id).unwrap());
    assert!(registry.verify_tally(id).unwrap());

    let events = log.events();
    assert_eq!(events.len(), 4);
    assert_eq!(
        events[0],
        RegistryEvent::RecordCreated {
            id,
            title: "Test".into(),
            creator,
        }
    );
    assert_eq!(
        events[3],
        RegistryEvent::VoteCast {
            record_id: id,
            voter: b,
            category: VoteCategory::Negative,
        }
    );
}

#[test]
fn empty_title_keeps_first_id_available() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    let err = registry.insert(&account("a"), &content("")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidField { ref field, .. } if field == "title"));
    assert!(err.is_rejection());
    assert_eq!(registry.record_count().unwrap(), 0);
    assert!(log.is_empty());

    assert_eq!(
        registry.insert(&account("a"), &content("Test")).unwrap(),
        RecordId::new(1)
    );
}

#[test]
fn title_at_exclusive_bound_is_rejected() {
    let (registry, _log) = null_registry(&RegistryConfig::default());
    let err = registry
        .insert(&account("a"), &content(&"x".repeat(50)))
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidField { .. }));
    assert!(registry
        .insert(&account("a"), &content(&"x".repeat(49)))
        .is_ok());
}

#[test]
fn unassigned_ids_are_not_found() {
    let (registry, _log) = null_registry(&RegistryConfig::default());
    registry.insert(&account("a"), &content("One")).unwrap();
    for id in [0, 2, u64::MAX] {
        assert!(matches!(
            registry.get(RecordId::new(id)),
            Err(RegistryError::NotFound(n)) if n == id
        ));
    }
}

#[test]
fn zero_based_ids() {
    let config = RegistryConfig {
        id_base: IdBase::Zero,
        ..RegistryConfig::default()
    };
    let (registry, _log) = null_registry(&config);
    assert_eq!(registry.next_id().unwrap(), RecordId::new(0));
    assert_eq!(
        registry.insert(&account("a"), &content("First")).unwrap(),
        RecordId::new(0)
    );
    assert_eq!(
        registry.insert(&account("a"), &content("Second")).unwrap(),
        RecordId::new(1)
    );
    assert_eq!(
        registry.all_ids().unwrap(),
        vec![RecordId::new(0), RecordId::new(1)]
    );
}

#[test]
fn single_submission_per_creator() {
    let config = RegistryConfig {
        single_submission: true,
        ..RegistryConfig::default()
    };
    let (registry, log) = null_registry(&config);
    registry.insert(&account("a"), &content("First")).unwrap();
    let err = registry
        .insert(&account("a"), &content("Second"))
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateSubmission(ref who) if who == "a"));
    assert_eq!(log.len(), 1);
    assert_eq!(
        registry.records_by_creator(&account("a")).unwrap(),
        vec![RecordId::new(1)]
    );
}

#[test]
fn custom_schema_from_config() {
    let config = RegistryConfig {
        schema: SchemaConfig::custom(
            RecordSchema::new(
                "recipes",
                "dish",
                vec![
                    FieldRule::required("dish", 1, 20),
                    FieldRule::optional("notes", 10).inclusive(),
                ],
            )
            .unwrap(),
        ),
        ..RegistryConfig::default()
    };
    let (registry, log) = null_registry(&config);

    let mut fields = BTreeMap::new();
    fields.insert("dish".to_string(), "Soup".to_string());
    let id = registry.insert(&account("chef"), &fields).unwrap();
    assert_eq!(registry.get(id).unwrap().field("notes"), Some(""));

    fields.insert("notes".to_string(), "x".repeat(10));
    assert!(registry.insert(&account("chef"), &fields).is_ok());

    fields.insert("garnish".to_string(), "parsley".to_string());
    assert!(matches!(
        registry.insert(&account("chef"), &fields),
        Err(RegistryError::InvalidField { ref field, .. }) if field == "garnish"
    ));

    assert!(matches!(
        &log.events()[0],
        RegistryEvent::RecordCreated { title, .. } if title == "Soup"
    ));
}

// ---------------------------------------------------------------------------
// 2. Vote policies
// ---------------------------------------------------------------------------

#[test]
fn repeat_vote_ignored_without_notification() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    let id = registry.insert(&account("c"), &content("Test")).unwrap();
    let voter = account("v");

    registry.cast_vote(id, &voter, VoteCategory::Negative).unwrap();
    let writes = registry.store().applied_batches();
    let outcome = registry.cast_vote(id, &voter, VoteCategory::Negative).unwrap();

    assert_eq!(outcome, VoteOutcome::Unchanged);
    assert_eq!(registry.store().applied_batches(), writes);
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 0, negative: 1 });
    assert_eq!(log.len(), 2);
}

#[test]
fn repeat_vote_rejected_under_reject_policy() {
    let config = RegistryConfig {
        repeat_vote: RepeatVotePolicy::Reject,
        ..RegistryConfig::default()
    };
    let (registry, log) = null_registry(&config);
    let id = registry.insert(&account("c"), &content("Test")).unwrap();
    let voter = account("v");

    registry.cast_vote(id, &voter, VoteCategory::Positive).unwrap();
    assert!(matches!(
        registry.cast_vote(id, &voter, VoteCategory::Positive),
        Err(RegistryError::DuplicateVote { record: 1, ref voter }) if voter == "v"
    ));
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 1, negative: 0 });
    assert_eq!(log.len(), 2);

    // A swap is still allowed.
    registry.cast_vote(id, &voter, VoteCategory::Negative).unwrap();
    assert_eq!(registry.tally(id).unwrap(), Tally { positive: 0, negative: 1 });
}

#[test]
fn majority_is_strict() {
    let (registry, _log) = null_registry(&RegistryConfig::default());
    let id = registry.insert(&account("c"), &content("Test")).unwrap();
    assert!(!registry.has_majority_positive(id).unwrap());

    registry.cast_vote(id, &account("a"), VoteCategory::Positive).unwrap();
    assert!(registry.has_majority_positive(id).unwrap());

    registry.cast_vote(id, &account("b"), VoteCategory::Negative).unwrap();
    assert!(!registry.has_majority_positive(id).unwrap());
}

#[test]
fn vote_on_missing_record_writes_nothing() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    assert!(matches!(
        registry.cast_vote(RecordId::new(1), &account("a"), VoteCategory::Positive),
        Err(RegistryError::NotFound(1))
    ));
    assert_eq!(registry.store().applied_batches(), 0);
    assert!(log.is_empty());
}

#[test]
fn failed_vote_write_changes_nothing() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    let id = registry.insert(&account("c"), &content("Test")).unwrap();
    registry.store().fail_next_apply("io error");

    let err = registry
        .cast_vote(id, &account("a"), VoteCategory::Positive)
        .unwrap_err();
    assert!(matches!(err, RegistryError::Store(_)));
    assert_eq!(registry.tally(id).unwrap(), Tally::ZERO);
    assert_eq!(registry.vote_of(id, &account("a")).unwrap(), None);
    assert_eq!(log.len(), 1);
}

// ---------------------------------------------------------------------------
// 3. Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_inserts_and_votes_stay_consistent() {
    let (registry, log) = null_registry(&RegistryConfig::default());
    let registry = Arc::new(registry);
    let target = registry.insert(&account("seed"), &content("Target")).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let registry = registry.clone();
            thread::spawn(move || {
                let me = account(&format!("worker-{}", t));
                for i in 0..10 {
                    registry
                        .insert(&me, &content(&format!("{}-{}", t, i)))
                        .unwrap();
                    let category = if i % 2 == 0 {
                        VoteCategory::Positive
                    } else {
                        VoteCategory::Negative
                    };
                    registry.cast_vote(target, &me, category).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(registry.record_count().unwrap(), 81);
    let ids = registry.all_ids().unwrap();
    assert_eq!(ids.len(), 81);
    assert!(ids.windows(2).all(|w| w[0] < w[1]));

    // Every worker ended on Negative (i = 9).
    assert_eq!(
        registry.tally(target).unwrap(),
        Tally { positive: 0, negative: 8 }
    );
    assert!(registry.verify_tally(target).unwrap());
    // 81 creations + 8 workers × 10 vote changes.
    assert_eq!(log.len(), 81 + 80);
}

// ---------------------------------------------------------------------------
// 4. LMDB persistence
// ---------------------------------------------------------------------------

#[test]
fn lmdb_state_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = lmdb_config(&dir);

    let id = {
        let registry = Registry::open_lmdb(&config).unwrap();
        let id = registry.insert(&account("alice"), &content("Test")).unwrap();
        registry
            .cast_vote(id, &account("bob"), VoteCategory::Positive)
            .unwrap();
        registry
            .cast_vote(id, &account("bob"), VoteCategory::Negative)
            .unwrap();
        registry
            .cast_vote(id, &account("carol"), VoteCategory::Negative)
            .unwrap();
        id
    };

    let registry = Registry::open_lmdb(&config).unwrap();
    let record = registry.get(id).unwrap();
    assert_eq!(record.fields, content("Test"));
    assert_eq!(record.tally, Tally { positive: 0, negative: 2 });
    assert_eq!(
        registry.vote_of(id, &account("bob")).unwrap(),
        Some(VoteCategory::Negative)
    );
    assert_eq!(
        registry.votes(id).unwrap(),
        vec![
            (account("bob"), VoteCategory::Negative),
            (account("carol"), VoteCategory::Negative),
        ]
    );
    assert_eq!(
        registry.records_by_creator(&account("alice")).unwrap(),
        vec![id]
    );
    assert_eq!(registry.next_id().unwrap(), RecordId::new(2));
    assert!(registry.verify_tally(id).unwrap());
}

#[test]
fn lmdb_single_submission_survives_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = RegistryConfig {
        single_submission: true,
        ..lmdb_config(&dir)
    };

    {
        let registry = Registry::open_lmdb(&config).unwrap();
        registry.insert(&account("alice"), &content("Mine")).unwrap();
    }

    let registry = Registry::open_lmdb(&config).unwrap();
    assert!(matches!(
        registry.insert(&account("alice"), &content("Again")),
        Err(RegistryError::DuplicateSubmission(_))
    ));
}

#[test]
fn lmdb_reopen_with_other_id_base_is_refused() {
    let dir = tempfile::tempdir().expect("temp dir");
    let config = lmdb_config(&dir);
    drop(Registry::open_lmdb(&config).unwrap());

    let other = RegistryConfig {
        id_base: IdBase::Zero,
        ..config
    };
    assert!(matches!(
        Registry::open_lmdb(&other),
        Err(RegistryError::Config(_))
    ));
}

#[test]
fn lmdb_overlong_account_is_a_rejection() {
    let dir = tempfile::tempdir().expect("temp dir");
    let registry = Registry::open_lmdb(&lmdb_config(&dir)).unwrap();
    let long = account(&"x".repeat(600));

    let err = registry.insert(&long, &content("Test")).unwrap_err();
    assert!(matches!(err, RegistryError::InvalidAccount { len: 600, .. }));
    assert!(err.is_rejection());
    assert_eq!(registry.record_count().unwrap(), 0);

    let id = registry.insert(&account("alice"), &content("Test")).unwrap();
    let err = registry
        .cast_vote(id, &long, VoteCategory::Positive)
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidAccount { .. }));
    assert!(err.is_rejection());
    assert!(matches!(
        registry.records_by_creator(&long),
        Err(RegistryError::InvalidAccount { .. })
    ));
    assert_eq!(registry.tally(id).unwrap(), Tally::ZERO);
}

#[test]
fn lmdb_longest_account_round_trips() {
    let dir = tempfile::tempdir().expect("temp dir");
    let registry = Registry::open_lmdb(&lmdb_config(&dir)).unwrap();
    let longest = account(&"y".repeat(AccountId::MAX_LEN));

    let id = registry.insert(&longest, &content("Test")).unwrap();
    registry
        .cast_vote(id, &longest, VoteCategory::Negative)
        .unwrap();
    assert_eq!(registry.records_by_creator(&longest).unwrap(), vec![id]);
    assert_eq!(
        registry.vote_of(id, &longest).unwrap(),
        Some(VoteCategory::Negative)
    );
    assert_eq!(registry.votes(id).unwrap(), vec![(longest, VoteCategory::Negative)]);
}
