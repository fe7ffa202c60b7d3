use crate::backend::{CellValue, WorkbookBackend};
use crate::generator::{cast, reference};
use indexmap::IndexMap;
use schema_template_core::{Result, ScalarValue};

/// Name of the sheet holding workbook variables
pub const VARIABLES_SHEET_NAME: &str = "# Variables";

/// Add the variables sheet and one workbook-level name per variable
pub(crate) fn write_variables_sheet<B>(
    backend: &mut B,
    variables: &IndexMap<String, ScalarValue>,
) -> Result<()>
where
    B: WorkbookBackend + ?Sized,
{
    backend.add_sheet(VARIABLES_SHEET_NAME)?;
    backend.write_cell(VARIABLES_SHEET_NAME, 0, 0, CellValue::Text("Name".into()), None)?;
    backend.write_cell(VARIABLES_SHEET_NAME, 0, 1, CellValue::Text("Value".into()), None)?;

    for (index, (name, value)) in variables.iter().enumerate() {
        let row = cast::usize_to_u32_row(index + 1)?;
        backend.write_cell(VARIABLES_SHEET_NAME, row, 0, CellValue::Text(name.clone()), None)?;
        backend.write_cell(VARIABLES_SHEET_NAME, row, 1, CellValue::from(value), None)?;
        backend.define_name(
            name,
            &reference::absolute_cell(VARIABLES_SHEET_NAME, 1, row + 1),
        )?;
        tracing::debug!(%name, "defined variable");
    }
    Ok(())
}
