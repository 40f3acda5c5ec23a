use tally_store::StoreError;
use tally_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoteError {
    #[error("invalid vote category: {0}")]
    InvalidCategory(#[from] TypeError),

    #[error("account {voter} has already cast this vote on record {record}")]
    DuplicateVote { record: u64, voter: String },

    #[error("tally of record {0} is inconsistent with its vote map")]
    TallyCorrupted(u64),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
