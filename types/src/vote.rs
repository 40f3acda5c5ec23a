//! Vote categories and the per-record tally.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// The category of a single vote.
///
/// "No vote" is not a category: it is the absence of an entry in the vote map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoteCategory {
    /// Upvote / positive vote.
    Positive,
    /// Downvote / negative vote.
    Negative,
}

impl VoteCategory {
    /// Code reserved for "no vote". Never accepted as a category.
    pub const NONE_CODE: u8 = 0;

    /// Decode a raw category code (`1` = positive, `2` = negative).
    pub fn from_code(code: u8) -> Result<Self, TypeError> {
        match code {
            1 => Ok(Self::Positive),
            2 => Ok(Self::Negative),
            other => Err(TypeError::InvalidCategory(other)),
        }
    }

    /// The raw code of this category, the inverse of [`VoteCategory::from_code`].
    pub fn code(&self) -> u8 {
        match self {
            Self::Positive => 1,
            Self::Negative => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for VoteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VoteCategory {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "positive" | "up" | "upvote" => Ok(Self::Positive),
            "negative" | "down" | "downvote" => Ok(Self::Negative),
            _ => Err(TypeError::InvalidCategoryName(s.to_string())),
        }
    }
}

/// The two opposing counters attached to a record.
///
/// Each counter equals the number of distinct voters whose current vote on the
/// record is that category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub positive: u64,
    pub negative: u64,
}

impl Tally {
    pub const ZERO: Self = Self {
        positive: 0,
        negative: 0,
    };

    pub fn count(&self, category: VoteCategory) -> u64 {
        match category {
            VoteCategory::Positive => self.positive,
            VoteCategory::Negative => self.negative,
        }
    }

    /// Total number of voters with a live vote.
    pub fn total(&self) -> u64 {
        self.positive + self.negative
    }

    /// Move one voter from `previous` (if any) to `next`.
    ///
    /// Returns `None` if the bucket being decremented is already zero or the
    /// bucket being incremented would overflow.
    pub fn swapped(&self, previous: Option<VoteCategory>, next: VoteCategory) -> Option<Self> {
        let mut tally = *self;
        if let Some(prev) = previous {
            let bucket = tally.bucket_mut(prev);
            *bucket = bucket.checked_sub(1)?;
        }
        let bucket = tally.bucket_mut(next);
        *bucket = bucket.checked_add(1)?;
        Some(tally)
    }

    /// Strict majority: ties (including 0/0) are not a positive majority.
    pub fn has_majority_positive(&self) -> bool {
        self.positive > self.negative
    }

    fn bucket_mut(&mut self, category: VoteCategory) -> &mut u64 {
        match category {
            VoteCategory::Positive => &mut self.positive,
            VoteCategory::Negative => &mut self.negative,
        }
    }
}
