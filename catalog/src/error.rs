use tally_store::StoreError;
use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("record {0} not found")]
    NotFound(u64),

    #[error("account {0} has already submitted a record")]
    DuplicateSubmission(String),

    #[error("invalid schema '{schema}': {reason}")]
    InvalidSchema { schema: String, reason: String },

    #[error("catalog counter exhausted at {0}")]
    CounterExhausted(u64),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
