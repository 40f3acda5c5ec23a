//! Record schemas: the declared field table of a catalog.
//!
//! The presets reproduce the field limits of the registry variants this
//! library replaces. Custom schemas can be declared in configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::validation::{FieldRule, UpperBound};
use tally_types::Record;

/// Names accepted by [`RecordSchema::preset`].
pub const PRESETS: &[&str] = &["education_content", "plant", "app_listing", "whitepaper"];

/// The declared fields of every record in one catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    /// Field carried as the human-readable name in `RecordCreated` events.
    pub title_field: String,
    pub fields: Vec<FieldRule>,
}

impl RecordSchema {
    /// Build a schema and check its definition.
    pub fn new(
        name: impl Into<String>,
        title_field: impl Into<String>,
        fields: Vec<FieldRule>,
    ) -> Result<Self, CatalogError> {
        let schema = Self {
            name: name.into(),
            title_field: title_field.into(),
            fields,
        };
        schema.check_definition()?;
        Ok(schema)
    }

    /// Look up a built-in schema by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "education_content" => Some(Self::education_content()),
            "plant" => Some(Self::plant()),
            "app_listing" => Some(Self::app_listing()),
            "whitepaper" => Some(Self::whitepaper()),
            _ => None,
        }
    }

    pub fn education_content() -> Self {
        Self {
            name: "education_content".into(),
            title_field: "title".into(),
            fields: vec![
                FieldRule::required("title", 1, 50),
                FieldRule::required("description", 1, 500),
                FieldRule::required("url", 1, 1000),
                FieldRule::required("content_type", 1, 50),
            ],
        }
    }

    pub fn plant() -> Self {
        Self {
            name: "plant".into(),
            title_field: "common_name".into(),
            fields: vec![
                FieldRule::required("common_name", 1, 100),
                FieldRule::required("scientific_name", 1, 100),
                FieldRule::required("description", 1, 1000).inclusive(),
                FieldRule::optional("photo_url", 300),
            ],
        }
    }

    pub fn app_listing() -> Self {
        Self {
            name: "app_listing".into(),
            title_field: "name".into(),
            fields: vec![
                FieldRule::required("name", 1, 50),
                FieldRule::required("description", 1, 300),
                FieldRule::required("url", 1, 200),
                FieldRule::required("category", 1, 50),
            ],
        }
    }

    pub fn whitepaper() -> Self {
        Self {
            name: "whitepaper".into(),
            title_field: "title".into(),
            fields: vec![
                FieldRule::required("title", 1, 200),
                FieldRule::required("abstract", 1, 1000).inclusive(),
                FieldRule::required("url", 1, 500),
            ],
        }
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|r| r.name == name)
    }

    /// The record's title field value.
    pub fn title_of<'a>(&self, record: &'a Record) -> &'a str {
        record.field(&self.title_field).unwrap_or("")
    }

    /// Reject schemas that no submission could satisfy, or whose title
    /// field could be empty.
    pub fn check_definition(&self) -> Result<(), CatalogError> {
        if self.fields.is_empty() {
            return Err(self.invalid("no fields declared"));
        }

        let mut seen = HashSet::new();
        for rule in &self.fields {
            if rule.name.is_empty() {
                return Err(self.invalid("field with empty name"));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(self.invalid(&format!("field '{}' declared twice", rule.name)));
            }
            if rule.required && rule.min == 0 {
                return Err(self.invalid(&format!(
                    "field '{}' is required but allows length 0",
                    rule.name
                )));
            }
            let satisfiable = match rule.upper {
                UpperBound::Exclusive => rule.min.max(1) < rule.max,
                UpperBound::Inclusive => rule.min.max(1) <= rule.max,
            };
            if !satisfiable {
                return Err(self.invalid(&format!(
                    "field '{}' admits no non-empty value (min {}, max {})",
                    rule.name, rule.min, rule.max
                )));
            }
        }

        match self.rule(&self.title_field) {
            Some(rule) if rule.required => Ok(()),
            Some(_) => Err(self.invalid(&format!(
                "title field '{}' must be required",
                self.title_field
            ))),
            None => Err(self.invalid(&format!(
                "title field '{}' is not declared",
                self.title_field
            ))),
        }
    }

    fn invalid(&self, reason: &str) -> CatalogError {
        CatalogError::InvalidSchema {
            schema: self.name.clone(),
            reason: reason.to_string(),
        }
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::education_content()
    }
}
