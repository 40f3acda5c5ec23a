//! Registry configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use tally_catalog::{CatalogPolicy, FieldRule, IdBase, RecordSchema};
use tally_votes::RepeatVotePolicy;

use crate::logging::LogFormat;
use crate::RegistryError;

/// Configuration for one registry deployment.
///
/// Can be loaded from a TOML file via [`RegistryConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Identifier strategy: `"one"` (ids 1, 2, ...) or `"zero"` (ids 0, 1, ...).
    #[serde(default)]
    pub id_base: IdBase,

    /// What a repeated identical vote does: `"ignore"` or `"reject"`.
    #[serde(default)]
    pub repeat_vote: RepeatVotePolicy,

    /// Allow at most one record per creator.
    #[serde(default)]
    pub single_submission: bool,

    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Field table of the catalog.
    #[serde(default)]
    pub schema: SchemaConfig,
}

/// Either a built-in preset or an explicit field table.
///
/// ```toml
/// [schema]
/// preset = "plant"
/// ```
///
/// ```toml
/// [schema]
/// name = "recipes"
/// title_field = "title"
///
/// [[schema.fields]]
/// name = "title"
/// max = 50
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRule>,
}

impl SchemaConfig {
    pub fn preset(name: impl Into<String>) -> Self {
        Self {
            preset: Some(name.into()),
            name: None,
            title_field: None,
            fields: Vec::new(),
        }
    }

    pub fn custom(schema: RecordSchema) -> Self {
        Self {
            preset: None,
            name: Some(schema.name),
            title_field: Some(schema.title_field),
            fields: schema.fields,
        }
    }

    /// Turn the configuration into a checked schema.
    pub fn resolve(&self) -> Result<RecordSchema, RegistryError> {
        if let Some(preset) = &self.preset {
            if !self.fields.is_empty() || self.title_field.is_some() {
                return Err(RegistryError::Config(format!(
                    "schema sets preset '{}' and an explicit field table",
                    preset
                )));
            }
            return RecordSchema::preset(preset).ok_or_else(|| {
                RegistryError::Config(format!(
                    "unknown schema preset '{}' (expected one of: {})",
                    preset,
                    tally_catalog::schema::PRESETS.join(", ")
                ))
            });
        }

        let title_field = self
            .title_field
            .clone()
            .ok_or_else(|| RegistryError::Config("schema needs a title_field".into()))?;
        let name = self.name.clone().unwrap_or_else(|| "custom".to_string());
        RecordSchema::new(name, title_field, self.fields.clone())
            .map_err(|e| RegistryError::Config(e.to_string()))
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self::preset("education_content")
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl RegistryConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, RegistryError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RegistryError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, RegistryError> {
        toml::from_str(s).map_err(|e| RegistryError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, RegistryError> {
        toml::to_string_pretty(self).map_err(|e| RegistryError::Config(e.to_string()))
    }

    pub fn catalog_policy(&self) -> CatalogPolicy {
        CatalogPolicy {
            id_base: self.id_base,
            single_submission: self.single_submission,
        }
    }

    pub fn log_format(&self) -> Result<LogFormat, RegistryError> {
        self.log_format.parse().map_err(RegistryError::Config)
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            id_base: IdBase::default(),
            repeat_vote: RepeatVotePolicy::default(),
            single_submission: false,
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            schema: SchemaConfig::default(),
        }
    }
}
