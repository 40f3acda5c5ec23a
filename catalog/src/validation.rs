//! Field-length validation applied before a record enters the catalog.
//!
//! Lengths are measured in UTF-8 bytes, not characters: a 10-character
//! title in a multibyte script can exceed a 20-byte limit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Whether a rule's `max` is itself an allowed length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpperBound {
    /// `len < max`
    #[default]
    Exclusive,
    /// `len <= max`
    Inclusive,
}

/// Declared length policy for one record field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,
    /// Minimum byte length of a non-empty value. A required field must
    /// declare at least 1; schemas with `min = 0` on a required field are
    /// rejected when the schema is built.
    #[serde(default = "default_min")]
    pub min: usize,
    pub max: usize,
    #[serde(default)]
    pub upper: UpperBound,
    /// Required fields reject the empty string. Optional fields accept it
    /// but still bound any non-empty value.
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_min() -> usize {
    1
}

fn default_true() -> bool {
    true
}

impl FieldRule {
    /// A required field with `min <= len < max`.
    pub fn required(name: impl Into<String>, min: usize, max: usize) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            upper: UpperBound::Exclusive,
            required: true,
        }
    }

    /// An optional field: empty, or `1 <= len < max`.
    pub fn optional(name: impl Into<String>, max: usize) -> Self {
        Self {
            name: name.into(),
            min: 1,
            max,
            upper: UpperBound::Exclusive,
            required: false,
        }
    }

    /// Make `max` itself an allowed length.
    pub fn inclusive(mut self) -> Self {
        self.upper = UpperBound::Inclusive;
        self
    }

    /// Largest accepted byte length.
    pub fn max_len(&self) -> usize {
        match self.upper {
            UpperBound::Exclusive => self.max.saturating_sub(1),
            UpperBound::Inclusive => self.max,
        }
    }

    /// Check a single value against this rule.
    pub fn check(&self, value: &str) -> Result<(), ValidationError> {
        let len = value.len();
        if len == 0 {
            if self.required {
                return Err(self.violation(FieldViolation::Empty));
            }
            return Ok(());
        }
        if len < self.min {
            return Err(self.violation(FieldViolation::TooShort { len, min: self.min }));
        }
        if len > self.max_len() {
            return Err(self.violation(FieldViolation::TooLong {
                len,
                max: self.max_len(),
            }));
        }
        Ok(())
    }

    fn violation(&self, reason: FieldViolation) -> ValidationError {
        ValidationError::InvalidField {
            field: self.name.clone(),
            reason,
        }
    }
}

/// Which bound a field value broke.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldViolation {
    Empty,
    TooShort { len: usize, min: usize },
    /// `max` is the largest accepted length, after applying the bound kind.
    TooLong { len: usize, max: usize },
    /// The field is not declared by the schema.
    Unknown,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "must not be empty"),
            Self::TooShort { len, min } => {
                write!(f, "{} bytes is shorter than the minimum of {}", len, min)
            }
            Self::TooLong { len, max } => {
                write!(f, "{} bytes exceeds the maximum of {}", len, max)
            }
            Self::Unknown => write!(f, "not declared by the schema"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        field: String,
        reason: FieldViolation,
    },
}

impl ValidationError {
    pub fn field(&self) -> &str {
        match self {
            Self::InvalidField { field, .. } => field,
        }
    }
}

/// Validate a submission against a rule table.
///
/// Returns the normalized field map: every declared field present, with
/// omitted fields stored as the empty string. Undeclared fields are rejected.
pub fn validate_fields(
    rules: &[FieldRule],
    fields: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, ValidationError> {
    if let Some(unknown) = fields
        .keys()
        .find(|name| !rules.iter().any(|r| &r.name == *name))
    {
        return Err(ValidationError::InvalidField {
            field: unknown.clone(),
            reason: FieldViolation::Unknown,
        });
    }

    let mut normalized = BTreeMap::new();
    for rule in rules {
        let value = fields.get(&rule.name).map(String::as_str).unwrap_or("");
        rule.check(value)?;
        normalized.insert(rule.name.clone(), value.to_string());
    }
    Ok(normalized)
}
