//! Schema flattening
//!
//! A [`Flattener`] turns a JSON Schema into one field-path header per
//! logical sheet. [`FlattenToolCommand`] runs the external `flatten-tool`;
//! [`CsvDirectory`] reads headers that were generated beforehand.

mod command;
mod csv_dir;

pub use command::FlattenToolCommand;
pub use csv_dir::{CsvDirectory, MAX_SHEET_NAME_LEN, read_sheet_headers, sheet_name_from_stem};

use crate::generator::TemplateFeatures;
use async_trait::async_trait;
use indexmap::IndexMap;
use schema_template_core::{FieldPath, Result};
use std::path::PathBuf;

/// Parameters passed to the flattening tool
#[derive(Debug, Clone)]
pub struct FlattenRequest {
    /// JSON Schema to flatten
    pub schema_path: PathBuf,
    /// Name of the top-level sheet
    pub main_sheet_name: String,
    /// Length generated sheet-name components are truncated to
    pub truncation_length: usize,
    /// Well-known-text and roll-up switches
    pub features: TemplateFeatures,
}

/// Field-path headers per sheet, in the flattening tool's order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedSheets {
    sheets: IndexMap<String, Vec<FieldPath>>,
}

impl FlattenedSheets {
    /// Create an empty set of sheets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet, or replace the header of an existing one
    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<FieldPath>) {
        self.sheets.insert(name.into(), fields);
    }

    /// Header of a sheet
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[FieldPath]> {
        self.sheets.get(name).map(Vec::as_slice)
    }

    /// Whether a sheet exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Sheet names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.keys().map(String::as_str)
    }

    /// Sheets and their headers in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldPath])> {
        self.sheets
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    /// Number of sheets
    #[must_use]
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Whether there are no sheets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

impl<N, F> FromIterator<(N, Vec<F>)> for FlattenedSheets
where
    N: Into<String>,
    F: Into<FieldPath>,
{
    fn from_iter<I: IntoIterator<Item = (N, Vec<F>)>>(iter: I) -> Self {
        let mut sheets = Self::new();
        for (name, fields) in iter {
            sheets.insert(name, fields.into_iter().map(Into::into).collect());
        }
        sheets
    }
}

/// Produces per-sheet field-path headers for a schema
#[async_trait]
pub trait Flattener: Send + Sync {
    /// Flatten the schema
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::FlattenError` if flattening fails or its
    /// output cannot be read.
    async fn flatten(&self, request: &FlattenRequest) -> Result<FlattenedSheets>;
}
