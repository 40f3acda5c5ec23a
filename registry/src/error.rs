use thiserror::Error;

use tally_catalog::{CatalogError, FieldViolation, ValidationError};
use tally_store::StoreError;
use tally_store_lmdb::LmdbError;
use tally_types::TypeError;
use tally_votes::VoteError;

/// Every failure a registry operation can report.
///
/// The first six variants are request rejections: the call was refused and
/// no state changed. The rest are environmental.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: FieldViolation,
    },

    #[error("record {0} not found")]
    NotFound(u64),

    #[error("invalid vote category: {0}")]
    InvalidCategory(TypeError),

    #[error("invalid account: {len} bytes exceeds the {max}-byte limit")]
    InvalidAccount { len: usize, max: usize },

    #[error("account {0} has already submitted a record")]
    DuplicateSubmission(String),

    #[error("account {voter} has already cast this vote on record {record}")]
    DuplicateVote { record: u64, voter: String },

    #[error("catalog error: {0}")]
    Catalog(CatalogError),

    #[error("vote ledger error: {0}")]
    Ledger(VoteError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("registry lock poisoned")]
    LockPoisoned,
}

impl RegistryError {
    /// Whether this is a rejected request rather than an environmental failure.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidField { .. }
                | Self::NotFound(_)
                | Self::InvalidCategory(_)
                | Self::InvalidAccount { .. }
                | Self::DuplicateSubmission(_)
                | Self::DuplicateVote { .. }
        )
    }
}

impl From<TypeError> for RegistryError {
    fn from(e: TypeError) -> Self {
        match e {
            TypeError::AccountTooLong { len, max } => Self::InvalidAccount { len, max },
            other => Self::InvalidCategory(other),
        }
    }
}

impl From<CatalogError> for RegistryError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(ValidationError::InvalidField { field, reason }) => {
                Self::InvalidField { field, reason }
            }
            CatalogError::NotFound(id) => Self::NotFound(id),
            CatalogError::DuplicateSubmission(creator) => Self::DuplicateSubmission(creator),
            CatalogError::Store(e) => Self::Store(e),
            other => Self::Catalog(other),
        }
    }
}

impl From<VoteError> for RegistryError {
    fn from(e: VoteError) -> Self {
        match e {
            VoteError::InvalidCategory(e) => Self::from(e),
            VoteError::DuplicateVote { record, voter } => Self::DuplicateVote { record, voter },
            VoteError::Store(e) => Self::Store(e),
            other => Self::Ledger(other),
        }
    }
}
