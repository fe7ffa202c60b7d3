//! Field resolution
//!
//! Decides which flattened sheets are laid out and which fields each of
//! them carries, applying the configured sheet selection, field filters
//! and source fields.

use crate::flatten::FlattenedSheets;
use indexmap::{IndexMap, IndexSet};
use schema_template_core::{FieldPath, Result, TemplateConfig};
use std::fmt;
use tracing::{debug, info, warn};

/// A disagreement between the configured sheets and the flattened ones
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SheetMismatch {
    /// Flattened output has a sheet the configuration does not list
    Unconfigured(String),
    /// Configuration lists a sheet the flattened output lacks
    Missing(String),
}

impl SheetMismatch {
    /// Name of the sheet concerned
    #[must_use]
    pub fn sheet(&self) -> &str {
        match self {
            Self::Unconfigured(sheet) | Self::Missing(sheet) => sheet,
        }
    }
}

impl fmt::Display for SheetMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconfigured(sheet) => write!(
                f,
                "Skipping {sheet}. The flattened schema has this sheet, but it is missing from the config file. To include this sheet in the template, update your config file."
            ),
            Self::Missing(sheet) => write!(
                f,
                "Ignoring sheet {sheet}. This sheet is specified in the config file but missing from the flattened schema."
            ),
        }
    }
}

/// A sheet ready for layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSheet {
    /// Worksheet name
    pub name: String,
    /// Columns in order
    pub fields: Vec<FieldPath>,
}

/// Outcome of field resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSheets {
    /// Sheets to lay out, in order
    pub sheets: Vec<ResolvedSheet>,
    /// Sheets dropped because they have no fields, or only `id`
    pub skipped: Vec<String>,
    /// Sheet selection warnings
    pub warnings: Vec<SheetMismatch>,
}

impl ResolvedSheets {
    /// Fields of a resolved sheet
    #[must_use]
    pub fn fields(&self, sheet: &str) -> Option<&[FieldPath]> {
        self.sheets
            .iter()
            .find(|resolved| resolved.name == sheet)
            .map(|resolved| resolved.fields.as_slice())
    }

    /// Names of the resolved sheets in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str())
    }
}

/// Applies sheet selection, field filters and source fields
pub struct FieldResolver<'a> {
    config: &'a TemplateConfig,
    /// Synthetic source-field paths keyed by the real path they precede
    predecessors: IndexMap<FieldPath, Vec<FieldPath>>,
}

impl<'a> FieldResolver<'a> {
    /// Create a resolver for a configuration
    #[must_use]
    pub fn new(config: &'a TemplateConfig) -> Self {
        let mut predecessors: IndexMap<FieldPath, Vec<FieldPath>> = IndexMap::new();
        for (path, field) in config.source_field_paths() {
            predecessors
                .entry(field.successor.clone())
                .or_default()
                .push(path);
        }
        Self {
            config,
            predecessors,
        }
    }

    /// Resolve the sheets and fields to lay out
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::ConflictingFieldFilters` when both field
    /// filters are configured.
    pub fn resolve(&self, flattened: &FlattenedSheets) -> Result<ResolvedSheets> {
        self.config.validate()?;

        let mut resolved = ResolvedSheets::default();
        for name in self.select_sheets(flattened, &mut resolved.warnings) {
            let Some(header) = flattened.get(name) else {
                continue;
            };
            let fields = self.resolve_fields(header);
            if fields.is_empty() || (fields.len() == 1 && fields[0].is_identifier()) {
                info!(sheet = %name, "skipping sheet with no fields to enter");
                resolved.skipped.push(name.to_string());
                continue;
            }
            debug!(sheet = %name, fields = fields.len(), "resolved sheet");
            resolved.sheets.push(ResolvedSheet {
                name: name.to_string(),
                fields,
            });
        }
        Ok(resolved)
    }

    /// Sheet names to lay out, recording a warning per mismatch
    fn select_sheets<'f>(
        &'f self,
        flattened: &'f FlattenedSheets,
        warnings: &mut Vec<SheetMismatch>,
    ) -> Vec<&'f str> {
        if self.config.sheets.is_empty() {
            return flattened.names().collect();
        }

        for name in flattened.names() {
            if !self.config.sheets.iter().any(|sheet| sheet == name) {
                let mismatch = SheetMismatch::Unconfigured(name.to_string());
                warn!("{mismatch}");
                warnings.push(mismatch);
            }
        }

        let configured: IndexSet<&str> = self.config.sheets.iter().map(String::as_str).collect();
        let mut selected = Vec::with_capacity(configured.len());
        for name in configured {
            if flattened.contains(name) {
                selected.push(name);
            } else {
                let mismatch = SheetMismatch::Missing(name.to_string());
                warn!("{mismatch}");
                warnings.push(mismatch);
            }
        }
        selected
    }

    /// Fields of one sheet in header order
    fn resolve_fields(&self, header: &[FieldPath]) -> Vec<FieldPath> {
        let mut fields = Vec::with_capacity(header.len());
        for path in header {
            if let Some(synthetic) = self.predecessors.get(path) {
                fields.extend(synthetic.iter().cloned());
            }
            if self.is_included(path) {
                fields.push(path.clone());
            }
        }
        fields
    }

    fn is_included(&self, path: &FieldPath) -> bool {
        if !self.config.include_fields.is_empty() {
            self.config.include_fields.contains(path)
        } else if !self.config.exclude_fields.is_empty() {
            !self.config.exclude_fields.contains(path)
        } else {
            true
        }
    }
}
