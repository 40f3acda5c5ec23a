//! Append-only record catalog for the Tally registry.
//!
//! Records are validated against a declared [`RecordSchema`], assigned the
//! next sequential [`RecordId`](tally_types::RecordId) and never modified
//! afterwards except for their tally, which belongs to the vote ledger.
//!
//! The catalog never writes to the store itself. [`Catalog::prepare_insert`]
//! returns the record together with the [`StoreBatch`](tally_store::StoreBatch)
//! that persists it, and the caller applies the batch atomically.

pub mod catalog;
pub mod error;
pub mod schema;
pub mod validation;

pub use catalog::{Catalog, CatalogPolicy, IdBase, PreparedInsert};
pub use error::CatalogError;
pub use schema::RecordSchema;
pub use validation::{validate_fields, FieldRule, FieldViolation, UpperBound, ValidationError};
