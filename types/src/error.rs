//! Errors raised while constructing shared types from raw input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid vote category code {0}: expected 1 (positive) or 2 (negative)")]
    InvalidCategory(u8),

    #[error("invalid vote category name: {0}")]
    InvalidCategoryName(String),

    #[error("account id of {len} bytes exceeds the {max}-byte limit")]
    AccountTooLong { len: usize, max: usize },
}
