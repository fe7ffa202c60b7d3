use super::{CellRange, CellStyle, CellValue, WorkbookBackend};
use crate::validation::ValidationRule;
use indexmap::IndexMap;
use schema_template_core::{Result, TemplateError};
use std::collections::BTreeMap;

/// A cell as recorded by [`MemoryWorkbook`]
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCell {
    /// Written value
    pub value: CellValue,
    /// Style, if one was given
    pub style: Option<CellStyle>,
}

/// A sheet as recorded by [`MemoryWorkbook`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySheet {
    cells: BTreeMap<(u32, u16), MemoryCell>,
    rows: BTreeMap<u32, (Option<f64>, Option<CellStyle>)>,
    columns: BTreeMap<u16, (f64, Option<CellStyle>)>,
    validations: Vec<(CellRange, ValidationRule)>,
    frozen: Option<(u32, u16)>,
    hidden: bool,
}

impl MemorySheet {
    /// Recorded cell
    #[must_use]
    pub fn cell(&self, row: u32, col: u16) -> Option<&MemoryCell> {
        self.cells.get(&(row, col))
    }

    /// Recorded value
    #[must_use]
    pub fn value(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cell(row, col).map(|cell| &cell.value)
    }

    /// Text or formula at a cell
    #[must_use]
    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        self.value(row, col).and_then(CellValue::as_text)
    }

    /// Style at a cell
    #[must_use]
    pub fn style(&self, row: u32, col: u16) -> Option<CellStyle> {
        self.cell(row, col).and_then(|cell| cell.style)
    }

    /// Number of columns with at least one written cell, counting from A
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.cells
            .keys()
            .map(|(_, col)| usize::from(*col) + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of rows with at least one written cell, counting from row 0
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.cells
            .keys()
            .filter_map(|(row, _)| usize::try_from(*row).ok())
            .map(|row| row + 1)
            .max()
            .unwrap_or(0)
    }

    /// Row height, if set
    #[must_use]
    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.rows.get(&row).and_then(|(height, _)| *height)
    }

    /// Row style, if set
    #[must_use]
    pub fn row_style(&self, row: u32) -> Option<CellStyle> {
        self.rows.get(&row).and_then(|(_, style)| *style)
    }

    /// Column width, if set
    #[must_use]
    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.columns.get(&col).map(|(width, _)| *width)
    }

    /// Validation rules in the order they were added
    #[must_use]
    pub fn validations(&self) -> &[(CellRange, ValidationRule)] {
        &self.validations
    }

    /// Validation rule covering a cell
    #[must_use]
    pub fn validation_at(&self, row: u32, col: u16) -> Option<&ValidationRule> {
        self.validations
            .iter()
            .find(|(range, _)| range.contains(row, col))
            .map(|(_, rule)| rule)
    }

    /// Frozen pane position
    #[must_use]
    pub fn frozen(&self) -> Option<(u32, u16)> {
        self.frozen
    }

    /// Whether the sheet is hidden
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }
}

/// Workbook back end that records every operation in memory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryWorkbook {
    sheets: IndexMap<String, MemorySheet>,
    names: IndexMap<String, String>,
    active: Option<String>,
}

impl MemoryWorkbook {
    /// Create an empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet names in tab order
    #[must_use]
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.keys().map(String::as_str).collect()
    }

    /// Recorded sheet
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.get(name)
    }

    /// Defined names and their references
    #[must_use]
    pub fn defined_names(&self) -> &IndexMap<String, String> {
        &self.names
    }

    /// The active sheet, if one was activated
    #[must_use]
    pub fn active_sheet(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .get_mut(name)
            .ok_or_else(|| TemplateError::workbook(format!("Unknown worksheet '{name}'")))
    }
}

impl WorkbookBackend for MemoryWorkbook {
    fn add_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheets.contains_key(name) {
            return Err(TemplateError::workbook(format!(
                "Worksheet name '{name}' is already in use"
            )));
        }
        self.sheets.insert(name.to_string(), MemorySheet::default());
        Ok(())
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u16,
        value: CellValue,
        style: Option<CellStyle>,
    ) -> Result<()> {
        self.sheet_mut(sheet)?
            .cells
            .insert((row, col), MemoryCell { value, style });
        Ok(())
    }

    fn set_row(
        &mut self,
        sheet: &str,
        row: u32,
        height: Option<f64>,
        style: Option<CellStyle>,
    ) -> Result<()> {
        self.sheet_mut(sheet)?.rows.insert(row, (height, style));
        Ok(())
    }

    fn set_column(
        &mut self,
        sheet: &str,
        col: u16,
        width: f64,
        style: Option<CellStyle>,
    ) -> Result<()> {
        self.sheet_mut(sheet)?.columns.insert(col, (width, style));
        Ok(())
    }

    fn freeze_panes(&mut self, sheet: &str, row: u32, col: u16) -> Result<()> {
        self.sheet_mut(sheet)?.frozen = Some((row, col));
        Ok(())
    }

    fn add_validation(
        &mut self,
        sheet: &str,
        range: CellRange,
        rule: &ValidationRule,
    ) -> Result<()> {
        self.sheet_mut(sheet)?
            .validations
            .push((range, rule.clone()));
        Ok(())
    }

    fn define_name(&mut self, name: &str, reference: &str) -> Result<()> {
        self.names.insert(name.to_string(), reference.to_string());
        Ok(())
    }

    fn hide_sheet(&mut self, sheet: &str) -> Result<()> {
        self.sheet_mut(sheet)?.hidden = true;
        Ok(())
    }

    fn activate_sheet(&mut self, sheet: &str) -> Result<()> {
        self.sheet_mut(sheet)?;
        self.active = Some(sheet.to_string());
        Ok(())
    }
}
