//! The config manifest and per-entry descriptor resolution.
//!
//! A manifest lists config entries the way the config service exports
//! them. Each entry gets a descriptor from, in order of preference: the
//! schema it references, its JSON sample, or its declared value type.

use crate::assembler::Flavor;
use crate::error::CodegenError;
use schemagen_core::{evaluate, infer, Descriptor, EnumValue, EvaluateOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Log levels a `LOG_LEVEL` entry may take.
pub const LOG_LEVELS: [&str; 6] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR", "FATAL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigType {
    Config,
    FeatureFlag,
    Schema,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    Bool,
    Int,
    Double,
    String,
    StringList,
    Json,
    LogLevel,
    Duration,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonPayload {
    pub json: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaPayload {
    pub schema: String,
    #[serde(default)]
    pub schema_type: Option<String>,
}

/// One stored value. Exactly one field is normally set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigValue {
    pub bool: Option<bool>,
    pub int: Option<serde_json::Value>,
    pub double: Option<serde_json::Value>,
    pub string: Option<String>,
    pub string_list: Option<serde_json::Value>,
    pub json: Option<JsonPayload>,
    pub log_level: Option<serde_json::Value>,
    pub schema: Option<SchemaPayload>,
    pub duration: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RowValue {
    #[serde(default)]
    pub value: ConfigValue,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub values: Vec<RowValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
    pub key: String,
    pub config_type: ConfigType,
    pub value_type: ValueType,
    #[serde(default)]
    pub rows: Vec<Row>,
    #[serde(default)]
    pub schema_key: Option<String>,
    #[serde(default)]
    pub send_to_client_sdk: bool,
}

impl ConfigEntry {
    fn values(&self) -> impl Iterator<Item = &ConfigValue> {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter())
            .map(|v| &v.value)
    }

    /// DSL text of a `SCHEMA` entry.
    fn schema_text(&self) -> Option<&str> {
        self.values()
            .find_map(|v| v.schema.as_ref())
            .map(|s| s.schema.as_str())
    }

    /// The first JSON sample among the rows.
    fn json_sample(&self) -> Option<&str> {
        self.values()
            .find_map(|v| v.json.as_ref())
            .map(|j| j.json.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub configs: Vec<ConfigEntry>,
}

/// A config entry with its descriptor, ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub key: String,
    pub descriptor: Descriptor,
}

/// An entry whose schema or sample could not be used. The entry is still
/// generated, from its value type.
#[derive(Debug)]
pub struct EntryFailure {
    pub key: String,
    pub error: CodegenError,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub entries: Vec<ResolvedEntry>,
    pub failures: Vec<EntryFailure>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, CodegenError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CodegenError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Resolve every entry `flavor` emits, in manifest order. A key seen
    /// again is reported as a failure and only its first entry is kept.
    pub fn resolve(&self, flavor: Flavor, options: &EvaluateOptions) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();
        for entry in self.configs.iter().filter(|e| flavor.includes(e)) {
            if !seen.insert(entry.key.as_str()) {
                tracing::warn!(key = %entry.key, "skipping duplicate config key");
                resolution.failures.push(EntryFailure {
                    key: entry.key.clone(),
                    error: CodegenError::DuplicateKey(entry.key.clone()),
                });
                continue;
            }
            let descriptor = match self.descriptor_for(entry, options) {
                Ok(d) => d,
                Err(error) => {
                    tracing::warn!(key = %entry.key, %error, "falling back to value type");
                    resolution.failures.push(EntryFailure {
                        key: entry.key.clone(),
                        error,
                    });
                    value_type_descriptor(entry.value_type)
                }
            };
            resolution.entries.push(ResolvedEntry {
                key: entry.key.clone(),
                descriptor,
            });
        }
        tracing::debug!(
            flavor = flavor.as_str(),
            entries = resolution.entries.len(),
            failures = resolution.failures.len(),
            "resolved manifest"
        );
        resolution
    }

    fn schema_entry(&self, key: &str) -> Option<&ConfigEntry> {
        self.configs
            .iter()
            .find(|e| e.config_type == ConfigType::Schema && e.key == key)
    }

    fn descriptor_for(
        &self,
        entry: &ConfigEntry,
        options: &EvaluateOptions,
    ) -> Result<Descriptor, CodegenError> {
        if let Some(schema_key) = &entry.schema_key {
            let text = self
                .schema_entry(schema_key)
                .and_then(ConfigEntry::schema_text)
                .ok_or_else(|| {
                    CodegenError::InvalidManifest(format!(
                        "schema '{}' referenced by '{}' not found",
                        schema_key, entry.key
                    ))
                })?;
            return evaluate(text, options).map_err(|source| CodegenError::Schema {
                key: entry.key.clone(),
                source,
            });
        }
        if entry.value_type == ValueType::Json {
            return match entry.json_sample() {
                Some(sample) => {
                    let value: serde_json::Value = serde_json::from_str(sample).map_err(|e| {
                        CodegenError::InvalidManifest(format!(
                            "JSON sample for '{}': {}",
                            entry.key, e
                        ))
                    })?;
                    Ok(infer(&value))
                }
                None => Ok(Descriptor::any()),
            };
        }
        Ok(value_type_descriptor(entry.value_type))
    }
}

/// Descriptor implied by a value type alone.
pub fn value_type_descriptor(value_type: ValueType) -> Descriptor {
    match value_type {
        ValueType::Bool => Descriptor::boolean(),
        ValueType::Int => Descriptor::integer(),
        ValueType::Double | ValueType::Duration => Descriptor::number(),
        ValueType::String => Descriptor::string(),
        ValueType::StringList => Descriptor::array(Descriptor::string()),
        ValueType::LogLevel => {
            let levels = LOG_LEVELS.iter().map(|l| EnumValue::from(*l)).collect();
            Descriptor::enumeration(levels).unwrap_or_else(|_| Descriptor::string())
        }
        ValueType::Json | ValueType::Other => Descriptor::any(),
    }
}
