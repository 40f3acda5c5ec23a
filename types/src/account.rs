//! Opaque account identity supplied by the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypeError;

/// The identity of the account performing an operation.
///
/// The registry never interprets the contents: two identities are the same
/// account exactly when their bytes are equal. Identities longer than
/// [`AccountId::MAX_LEN`] bytes are refused by every registry operation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Longest accepted identity, in UTF-8 bytes. Keeps every storage key
    /// built from an account well inside LMDB's 511-byte key limit.
    pub const MAX_LEN: usize = 256;

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Reject identities longer than [`AccountId::MAX_LEN`].
    pub fn check_len(&self) -> Result<(), TypeError> {
        let len = self.0.len();
        if len > Self::MAX_LEN {
            return Err(TypeError::AccountTooLong {
                len,
                max: Self::MAX_LEN,
            });
        }
        Ok(())
    }

    /// Return the raw identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
