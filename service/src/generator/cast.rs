use schema_template_core::{Result, TemplateError};

/// Excel has a maximum of 16,384 columns (2^14).
const MAX_EXCEL_COLUMNS: usize = 16_384;

/// Excel has a maximum of 1,048,576 rows (2^20).
const MAX_EXCEL_ROWS: usize = 1_048_576;

/// Safely cast usize to u16 for Excel column indices.
pub(crate) fn usize_to_u16_column(value: usize) -> Result<u16> {
    if value >= MAX_EXCEL_COLUMNS {
        return Err(TemplateError::workbook(format!(
            "Too many columns for Excel: {value} (max: {MAX_EXCEL_COLUMNS})"
        )));
    }

    u16::try_from(value)
        .map_err(|_| TemplateError::workbook(format!("Column index {value} cannot fit in u16")))
}

/// Safely cast usize to u32 for Excel row indices.
pub(crate) fn usize_to_u32_row(value: usize) -> Result<u32> {
    if value >= MAX_EXCEL_ROWS {
        return Err(TemplateError::workbook(format!(
            "Too many rows for Excel: {value} (max: {MAX_EXCEL_ROWS})"
        )));
    }

    u32::try_from(value)
        .map_err(|_| TemplateError::workbook(format!("Row index {value} cannot fit in u32")))
}
