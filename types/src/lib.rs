//! Fundamental types for the Tally record registry.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! account identities, record identifiers, catalogued records, vote categories
//! and the two-bucket tally attached to each record.

pub mod account;
pub mod error;
pub mod record;
pub mod vote;

pub use account::AccountId;
pub use error::TypeError;
pub use record::{Record, RecordId};
pub use vote::{Tally, VoteCategory};
