//! Abstract storage traits for the Tally record registry.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The catalog, the vote ledger and the registry depend only on them.
//!
//! Reads go through the individual store traits. Writes never do: every
//! state change is described as a [`StoreBatch`] and handed to
//! [`RegistryStore::apply`], which must apply all of it or none of it.

pub mod batch;
pub mod catalog;
pub mod error;
pub mod meta;
pub mod vote;

pub use batch::{BatchOp, StoreBatch};
pub use catalog::CatalogStore;
pub use error::StoreError;
pub use meta::MetaStore;
pub use vote::VoteStore;

/// A complete backend: all read traits plus atomic batch application.
pub trait RegistryStore: CatalogStore + VoteStore + MetaStore {
    /// Apply every operation in `batch` as one atomic unit.
    ///
    /// On error nothing in the batch is visible to subsequent reads.
    fn apply(&self, batch: StoreBatch) -> Result<(), StoreError>;
}
