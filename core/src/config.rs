//! Template configuration loaded from YAML
//!
//! A configuration file supplies the overrides applied on top of the
//! flattened schema (sheet selection, included or excluded fields, fixed
//! values, formulae, guidance, variables, package metadata and source
//! fields) together with defaults for the command-line options.
//!
//! Every container key is optional. An absent or `null` key becomes an
//! empty container; a key holding the wrong container type is rejected
//! with a configuration error that names the key.

use crate::error::{Result, TemplateError};
use crate::types::{FieldMetadata, FieldPath, ScalarValue};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::env;
use std::path::Path;

/// Default name of the main (parent) sheet
pub const DEFAULT_MAIN_SHEET_NAME: &str = "main";

/// Default number of input rows
pub const DEFAULT_INPUT_ROWS: u32 = 1000;

/// Default length of generated sheet name components
pub const DEFAULT_TRUNCATION_LENGTH: usize = 10;

/// Default output file name
pub const DEFAULT_OUTPUT_FILE: &str = "template.xlsx";

/// Load configuration from a `YAML` file with environment variable substitution
///
/// # Errors
///
/// Returns `TemplateError::IoError` if the file cannot be read and
/// `TemplateError::ConfigError` if it cannot be parsed or fails validation.
pub fn load_config(path: &Path) -> Result<TemplateConfig> {
    let contents = std::fs::read_to_string(path).map_err(TemplateError::IoError)?;
    let config = TemplateConfig::from_yaml_str(&contents)
        .map_err(|e| TemplateError::config(format!("{}: {e}", path.display())))?;
    tracing::debug!(path = %path.display(), "loaded template configuration");
    Ok(config)
}

/// Substitute environment variables in the format ${VAR:-default}
fn substitute_env_vars(content: &str) -> String {
    let re = match regex::Regex::new(r"\$\{([^}:]+)(?::(-)?([^}]*))?\}") {
        Ok(regex) => regex,
        Err(_) => return content.to_string(),
    };

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default_value = caps.get(3).map_or("", |m| m.as_str());

        env::var(var_name).unwrap_or_else(|_| default_value.to_string())
    })
    .to_string()
}

/// Treat an explicit `null` the same as an absent key
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A configured source field: a synthetic column that aliases a real one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFieldConfig {
    /// Path of the real field this source field precedes
    pub successor: FieldPath,

    /// Metadata shown in the synthetic column's header
    #[serde(flatten)]
    pub metadata: FieldMetadata,
}

/// Overrides and option defaults read from the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Sheets to include, in order; empty means every flattened sheet
    #[serde(deserialize_with = "null_as_default")]
    pub sheets: Vec<String>,

    /// Fields to keep; all others are dropped
    #[serde(deserialize_with = "null_as_default")]
    pub include_fields: Vec<FieldPath>,

    /// Fields to drop
    #[serde(deserialize_with = "null_as_default")]
    pub exclude_fields: Vec<FieldPath>,

    /// Key/value pairs written to the hidden configuration sheet
    #[serde(deserialize_with = "null_as_default")]
    pub package_metadata: IndexMap<String, ScalarValue>,

    /// Text used as the starting point of a field's input guidance
    #[serde(deserialize_with = "null_as_default")]
    pub field_guidance: IndexMap<FieldPath, String>,

    /// Values filled in whenever the anchor column of a row is populated
    #[serde(deserialize_with = "null_as_default")]
    pub fixed_values: IndexMap<FieldPath, ScalarValue>,

    /// Formula templates; `{row}` is replaced by the row number
    #[serde(deserialize_with = "null_as_default")]
    pub formulae: IndexMap<FieldPath, String>,

    /// Workbook-level named values
    #[serde(deserialize_with = "null_as_default")]
    pub variables: IndexMap<String, ScalarValue>,

    /// Synthetic source fields keyed by their (unprefixed) path
    #[serde(deserialize_with = "null_as_default")]
    pub source_fields: IndexMap<String, SourceFieldConfig>,

    /// Default for `--output-file`
    pub output_file: Option<String>,

    /// Default for `--codelist-base-url`
    pub codelist_base_url: Option<String>,

    /// Default for `--codelist-docs-url`
    pub codelist_docs_url: Option<String>,

    /// Default for well-known-text conversion
    pub wkt: Option<bool>,

    /// Default for `--input-rows`
    pub input_rows: Option<u32>,

    /// Default for `--main-sheet-name`
    pub main_sheet_name: Option<String>,

    /// Default for `--truncation-length`
    pub truncation_length: Option<usize>,

    /// Default for `--rollup`
    pub rollup: Option<bool>,
}

impl TemplateConfig {
    /// Parse and validate configuration from a YAML string
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::ConfigError` if a key has the wrong type, and
    /// the errors of [`TemplateConfig::validate`].
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let substituted = substitute_env_vars(contents);
        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&substituted)
            .map_err(|e| TemplateError::config(format!("Failed to parse YAML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-key constraints
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::ConflictingFieldFilters` when both field
    /// filters are set, and `TemplateError::ConfigError` for malformed URLs
    /// or a zero row budget.
    pub fn validate(&self) -> Result<()> {
        if !self.include_fields.is_empty() && !self.exclude_fields.is_empty() {
            return Err(TemplateError::ConflictingFieldFilters);
        }
        for (key, value) in [
            ("codelist_base_url", &self.codelist_base_url),
            ("codelist_docs_url", &self.codelist_docs_url),
        ] {
            if let Some(value) = value {
                url::Url::parse(value)
                    .map_err(|e| TemplateError::config(format!("{key} '{value}': {e}")))?;
            }
        }
        if self.input_rows == Some(0) {
            return Err(TemplateError::config("input_rows must be at least 1"));
        }
        Ok(())
    }

    /// Source fields keyed by their synthetic (`# `-prefixed) path
    #[must_use]
    pub fn source_field_paths(&self) -> IndexMap<FieldPath, &SourceFieldConfig> {
        self.source_fields
            .iter()
            .map(|(path, field)| (FieldPath::source_field(path), field))
            .collect()
    }
}
