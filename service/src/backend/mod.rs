//! Workbook back ends
//!
//! The layout engine talks to a [`WorkbookBackend`] rather than to a
//! spreadsheet library directly. [`XlsxBackend`] writes a real `.xlsx`
//! file; [`MemoryWorkbook`] records every call so layouts can be inspected
//! without a file.
//!
//! Rows and columns are zero-based throughout.

mod memory;
mod xlsx;

pub use memory::{MemoryCell, MemorySheet, MemoryWorkbook};
pub use xlsx::XlsxBackend;

use crate::validation::ValidationRule;
use schema_template_core::{Result, ScalarValue};

/// Value written to a single cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Literal text
    Text(String),
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Formula, including the leading `=`
    Formula(String),
    /// No value; only the cell style is applied
    Blank,
}

impl CellValue {
    /// Text value, or [`CellValue::Blank`] for an empty string
    #[must_use]
    pub fn text_or_blank(text: &str) -> Self {
        if text.is_empty() {
            Self::Blank
        } else {
            Self::Text(text.to_string())
        }
    }

    /// Text shown for text and formula cells
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Formula(text) => Some(text),
            Self::Number(_) | Self::Bool(_) | Self::Blank => None,
        }
    }
}

impl From<&ScalarValue> for CellValue {
    fn from(value: &ScalarValue) -> Self {
        match value {
            ScalarValue::Bool(value) => Self::Bool(*value),
            ScalarValue::Text(text) => Self::Text(text.clone()),
            ScalarValue::Integer(_) | ScalarValue::Float(_) => {
                Self::Number(value.as_number().unwrap_or_default())
            }
        }
    }
}

/// Number format applied to input cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    /// Default cell format
    General,
    /// Text (`@`), so that codes and identifiers are not reinterpreted
    Text,
    /// `yyyy-mm-dd`
    Date,
    /// `#,##0.00`
    Number,
    /// No format at all; used on the links sheet
    Unformatted,
}

impl InputFormat {
    /// Excel number format string, if any
    #[must_use]
    pub fn num_format(self) -> Option<&'static str> {
        match self {
            Self::General | Self::Unformatted => None,
            Self::Text => Some("@"),
            Self::Date => Some("yyyy-mm-dd"),
            Self::Number => Some("#,##0.00"),
        }
    }
}

/// Named cell styles understood by every back end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellStyle {
    /// Header labels in column A
    HeaderColumn,
    /// The `path` header row
    HeaderPath,
    /// The `title` header row
    HeaderTitle,
    /// Wrapped small text (`description`, `values`)
    HeaderWrapped,
    /// Small text (`required`, `type`)
    HeaderSmall,
    /// The `codelist` row when codelists link to documentation
    HeaderLink,
    /// The `codelist` row when codelists are plain labels
    HeaderLabel,
    /// The `input guidance` row
    HeaderGuidance,
    /// Input cells
    Input(InputFormat),
}

/// Rectangular block of cells, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    /// First row
    pub first_row: u32,
    /// First column
    pub first_col: u16,
    /// Last row
    pub last_row: u32,
    /// Last column
    pub last_col: u16,
}

impl CellRange {
    /// A single column between two rows
    #[must_use]
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Self {
        Self {
            first_row,
            first_col: col,
            last_row,
            last_col: col,
        }
    }

    /// Whether the range covers a cell
    #[must_use]
    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row)
            && (self.first_col..=self.last_col).contains(&col)
    }
}

/// Write-only workbook surface used by the layout engine
///
/// Sheets are addressed by name and must be added before they are written
/// to. Sheet order is the order of [`WorkbookBackend::add_sheet`] calls.
pub trait WorkbookBackend {
    /// Append a sheet
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the name is invalid or taken.
    fn add_sheet(&mut self, name: &str) -> Result<()>;

    /// Whether a sheet has been added
    fn has_sheet(&self, name: &str) -> bool;

    /// Write a value to a cell
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown or the
    /// cell is out of range.
    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u16,
        value: CellValue,
        style: Option<CellStyle>,
    ) -> Result<()>;

    /// Set a row's height and default style
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown.
    fn set_row(
        &mut self,
        sheet: &str,
        row: u32,
        height: Option<f64>,
        style: Option<CellStyle>,
    ) -> Result<()>;

    /// Set a column's width and default style
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown.
    fn set_column(
        &mut self,
        sheet: &str,
        col: u16,
        width: f64,
        style: Option<CellStyle>,
    ) -> Result<()>;

    /// Freeze the rows above and the columns left of a cell
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown.
    fn freeze_panes(&mut self, sheet: &str, row: u32, col: u16) -> Result<()>;

    /// Attach a validation rule to a range
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown or the
    /// rule cannot be expressed.
    fn add_validation(&mut self, sheet: &str, range: CellRange, rule: &ValidationRule)
    -> Result<()>;

    /// Define a workbook-level name
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the name is invalid.
    fn define_name(&mut self, name: &str, reference: &str) -> Result<()>;

    /// Hide a sheet
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown.
    fn hide_sheet(&mut self, sheet: &str) -> Result<()>;

    /// Make a sheet the one shown when the workbook is opened
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the sheet is unknown.
    fn activate_sheet(&mut self, sheet: &str) -> Result<()>;
}
