//! LMDB storage backend for the Tally record registry.
//!
//! Implements all storage traits from `tally-store` using the `heed` LMDB
//! bindings. Each logical store maps to one LMDB database within a single
//! environment, and every [`StoreBatch`](tally_store::StoreBatch) is applied
//! inside one LMDB write transaction.

pub mod catalog;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod keys;
pub mod meta;
pub mod migration;
pub mod vote;
pub mod write_batch;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use migration::{Migrator, CURRENT_SCHEMA_VERSION};
pub use write_batch::WriteBatch;
