//! Vote ledger for the Tally registry.
//!
//! Key principle: one account = one live vote per record. A vote can be
//! changed between positive and negative but never withdrawn. Changing a
//! vote moves the voter from one tally bucket to the other, so each bucket
//! always equals the number of voters currently in it.

pub mod error;
pub mod ledger;

pub use error::VoteError;
pub use ledger::{PreparedVote, RepeatVotePolicy, VoteLedger, VoteOutcome};
