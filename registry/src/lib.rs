//! Tally record registry: the service layer over the catalog and the vote ledger.
//!
//! The registry is the central coordinator that:
//! - Validates and catalogues new records under sequential identifiers
//! - Records one live vote per account per record, with swap semantics
//! - Serializes every state change behind one lock and commits it as one
//!   atomic store batch
//! - Emits exactly one notification per successful state change
//!
//! Storage is pluggable through `tally-store`; [`Registry::open_lmdb`] wires
//! up the durable LMDB backend from a [`RegistryConfig`].

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod registry;

pub use config::{RegistryConfig, SchemaConfig};
pub use error::RegistryError;
pub use events::{EventBus, EventLog, NotificationSink, RegistryEvent};
pub use logging::{init_logging, LogFormat};
pub use registry::Registry;

pub use tally_catalog::{FieldRule, IdBase, RecordSchema};
pub use tally_types::{AccountId, Record, RecordId, Tally, VoteCategory};
pub use tally_votes::{RepeatVotePolicy, VoteOutcome};
