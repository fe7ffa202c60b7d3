use super::{CellRange, CellStyle, CellValue, InputFormat, WorkbookBackend};
use crate::validation::{ErrorSeverity, ValidationRule};
use chrono::Datelike;
use rust_xlsxwriter::{
    Color, DataValidation, DataValidationErrorStyle, DataValidationRule, ExcelDateTime, Format,
    FormatAlign, FormatBorder, FormatUnderline, Formula, Workbook, Worksheet, XlsxError,
};
use schema_template_core::{Result, TemplateError};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

/// Background shared by every header row
const HEADER_BACKGROUND: Color = Color::RGB(0x00EF_EFEF);

/// Font size of the descriptive header rows
const SMALL_FONT_SIZE: f64 = 8.0;

/// Font size of the header labels in column A
const LABEL_FONT_SIZE: f64 = 11.0;

fn xlsx_error(err: XlsxError) -> TemplateError {
    TemplateError::workbook(err.to_string())
}

fn build_format(style: CellStyle) -> Format {
    let header = Format::new().set_background_color(HEADER_BACKGROUND);
    match style {
        CellStyle::HeaderColumn => header
            .set_bold()
            .set_font_size(LABEL_FONT_SIZE)
            .set_font_color(Color::Black),
        CellStyle::HeaderPath => header.set_bold(),
        CellStyle::HeaderTitle => header,
        CellStyle::HeaderWrapped => header
            .set_font_size(SMALL_FONT_SIZE)
            .set_text_wrap()
            .set_align(FormatAlign::Top),
        CellStyle::HeaderSmall => header.set_font_size(SMALL_FONT_SIZE),
        CellStyle::HeaderLink => header
            .set_font_size(SMALL_FONT_SIZE)
            .set_font_color(Color::Blue)
            .set_underline(FormatUnderline::Single),
        CellStyle::HeaderLabel => header
            .set_font_size(SMALL_FONT_SIZE)
            .set_font_color(Color::Black),
        CellStyle::HeaderGuidance => header
            .set_font_size(SMALL_FONT_SIZE)
            .set_text_wrap()
            .set_align(FormatAlign::Top)
            .set_border_bottom(FormatBorder::Thin),
        CellStyle::Input(input) => match input.num_format() {
            Some(num_format) => Format::new().set_num_format(num_format),
            None => Format::new(),
        },
    }
}

fn build_validation(rule: &ValidationRule) -> Result<DataValidation> {
    match rule {
        ValidationRule::List {
            source,
            severity,
            error_title,
            error_message,
        } => {
            let style = match severity {
                ErrorSeverity::Stop => DataValidationErrorStyle::Stop,
                ErrorSeverity::Warning => DataValidationErrorStyle::Warning,
            };
            DataValidation::new()
                .allow_list_formula(Formula::new(source))
                .set_error_style(style)
                .set_error_title(error_title)
                .map_err(xlsx_error)?
                .set_error_message(error_message)
                .map_err(xlsx_error)
        }
        ValidationRule::DateOnOrAfter(date) => {
            let year = u16::try_from(date.year())
                .map_err(|_| TemplateError::workbook(format!("Year out of range: {date}")))?;
            let month = u8::try_from(date.month())
                .map_err(|_| TemplateError::workbook(format!("Month out of range: {date}")))?;
            let day = u8::try_from(date.day())
                .map_err(|_| TemplateError::workbook(format!("Day out of range: {date}")))?;
            let minimum = ExcelDateTime::from_ymd(year, month, day).map_err(xlsx_error)?;
            Ok(DataValidation::new()
                .allow_date(DataValidationRule::GreaterThanOrEqualTo(minimum)))
        }
    }
}

/// Workbook back end that writes an `.xlsx` file with `rust_xlsxwriter`
pub struct XlsxBackend {
    workbook: Workbook,
    sheets: HashSet<String>,
    formats: HashMap<CellStyle, Format>,
}

impl XlsxBackend {
    /// Create an empty workbook
    #[must_use]
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheets: HashSet::new(),
            formats: HashMap::new(),
        }
    }

    /// Serialize the workbook
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the workbook cannot be assembled.
    pub fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.workbook
            .save_to_buffer()
            .map_err(|e| TemplateError::workbook(format!("Failed to save workbook: {e}")))
    }

    /// Write the workbook to `path`, replacing it atomically
    ///
    /// The content goes to a temporary file next to `path` first, so a
    /// failure never leaves a partial workbook behind.
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` if the workbook cannot be
    /// assembled and `TemplateError::IoError` if it cannot be written.
    pub fn save(self, path: &Path) -> Result<()> {
        let content = self.into_bytes()?;
        let directory = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(directory)?;
        file.write_all(&content)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| TemplateError::IoError(e.error))?;

        tracing::debug!(path = %path.display(), bytes = content.len(), "saved workbook");
        Ok(())
    }

    fn worksheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        if !self.sheets.contains(name) {
            return Err(TemplateError::workbook(format!("Unknown worksheet '{name}'")));
        }
        self.workbook.worksheet_from_name(name).map_err(xlsx_error)
    }

    fn format(&mut self, style: CellStyle) -> Format {
        self.formats
            .entry(style)
            .or_insert_with(|| build_format(style))
            .clone()
    }
}

impl Default for XlsxBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkbookBackend for XlsxBackend {
    fn add_sheet(&mut self, name: &str) -> Result<()> {
        if self.sheets.contains(name) {
            return Err(TemplateError::workbook(format!(
                "Worksheet name '{name}' is already in use"
            )));
        }
        self.workbook
            .add_worksheet()
            .set_name(name)
            .map_err(xlsx_error)?;
        self.sheets.insert(name.to_string());
        Ok(())
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheets.contains(name)
    }

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u16,
        value: CellValue,
        style: Option<CellStyle>,
    ) -> Result<()> {
        let format = style.map(|style| self.format(style));
        let worksheet = self.worksheet(sheet)?;
        match (value, format) {
            (CellValue::Text(text), Some(format)) => {
                worksheet.write_string_with_format(row, col, text, &format)
            }
            (CellValue::Text(text), None) => worksheet.write_string(row, col, text),
            (CellValue::Number(number), Some(format)) => {
                worksheet.write_number_with_format(row, col, number, &format)
            }
            (CellValue::Number(number), None) => worksheet.write_number(row, col, number),
            (CellValue::Bool(value), Some(format)) => {
                worksheet.write_boolean_with_format(row, col, value, &format)
            }
            (CellValue::Bool(value), None) => worksheet.write_boolean(row, col, value),
            (CellValue::Formula(formula), Some(format)) => worksheet.write_formula_with_format(
                row,
                col,
                Formula::new(formula).set_result(""),
                &format,
            ),
            (CellValue::Formula(formula), None) => {
                worksheet.write_formula(row, col, Formula::new(formula).set_result(""))
            }
            (CellValue::Blank, Some(format)) => worksheet.write_blank(row, col, &format),
            (CellValue::Blank, None) => return Ok(()),
        }
        .map_err(xlsx_error)?;
        Ok(())
    }

    fn set_row(
        &mut self,
        sheet: &str,
        row: u32,
        height: Option<f64>,
        style: Option<CellStyle>,
    ) -> Result<()> {
        let format = style.map(|style| self.format(style));
        let worksheet = self.worksheet(sheet)?;
        if let Some(height) = height {
            worksheet.set_row_height(row, height).map_err(xlsx_error)?;
        }
        if let Some(format) = format {
            worksheet.set_row_format(row, &format).map_err(xlsx_error)?;
        }
        Ok(())
    }

    fn set_column(
        &mut self,
        sheet: &str,
        col: u16,
        width: f64,
        style: Option<CellStyle>,
    ) -> Result<()> {
        let format = style.map(|style| self.format(style));
        let worksheet = self.worksheet(sheet)?;
        worksheet.set_column_width(col, width).map_err(xlsx_error)?;
        if let Some(format) = format {
            worksheet.set_column_format(col, &format).map_err(xlsx_error)?;
        }
        Ok(())
    }

    fn freeze_panes(&mut self, sheet: &str, row: u32, col: u16) -> Result<()> {
        self.worksheet(sheet)?
            .set_freeze_panes(row, col)
            .map_err(xlsx_error)?;
        Ok(())
    }

    fn add_validation(
        &mut self,
        sheet: &str,
        range: CellRange,
        rule: &ValidationRule,
    ) -> Result<()> {
        let validation = build_validation(rule)?;
        self.worksheet(sheet)?
            .add_data_validation(
                range.first_row,
                range.first_col,
                range.last_row,
                range.last_col,
                &validation,
            )
            .map_err(xlsx_error)?;
        Ok(())
    }

    fn define_name(&mut self, name: &str, reference: &str) -> Result<()> {
        self.workbook
            .define_name(name, reference)
            .map_err(xlsx_error)?;
        Ok(())
    }

    fn hide_sheet(&mut self, sheet: &str) -> Result<()> {
        self.worksheet(sheet)?.set_hidden(true);
        Ok(())
    }

    fn activate_sheet(&mut self, sheet: &str) -> Result<()> {
        self.worksheet(sheet)?.set_active(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_unknown_sheet_is_an_error() {
        let mut backend = XlsxBackend::new();
        assert!(backend.hide_sheet("missing").is_err());
    }

    #[test]
    fn test_sheet_name_too_long() {
        let mut backend = XlsxBackend::new();
        let err = backend
            .add_sheet("a_sheet_name_well_over_the_31_character_limit")
            .expect_err("name is too long");
        assert!(matches!(err, TemplateError::WorkbookError(_)));
    }

    #[test]
    fn test_validation_rules_convert() {
        let list = ValidationRule::List {
            source: "='# Enums'!$A$2:$A$3".to_string(),
            severity: ErrorSeverity::Warning,
            error_title: "Value not in codelist".to_string(),
            error_message: "You must use a code from the codelist.".to_string(),
        };
        assert!(build_validation(&list).is_ok());

        let date = NaiveDate::from_ymd_opt(1900, 1, 1).expect("valid date");
        assert!(build_validation(&ValidationRule::DateOnOrAfter(date)).is_ok());
    }

    #[test]
    fn test_into_bytes_produces_zip() {
        let mut backend = XlsxBackend::new();
        backend.add_sheet("main").expect("add sheet");
        backend
            .write_cell("main", 0, 0, CellValue::Text("id".into()), None)
            .expect("write cell");
        let bytes = backend.into_bytes().expect("serialize");
        assert_eq!(&bytes[..2], b"PK");
    }
}
