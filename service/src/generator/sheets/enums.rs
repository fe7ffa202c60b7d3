use crate::backend::{CellValue, WorkbookBackend};
use crate::generator::cast;
use crate::validation::{ENUMERATION_SHEET_NAME, EnumerationRegistry};
use schema_template_core::Result;

/// Fill the enumeration sheet: one column per registered code list, headed
/// by its field path.
pub(crate) fn write_enumeration_sheet<B>(backend: &mut B, registry: &EnumerationRegistry) -> Result<()>
where
    B: WorkbookBackend + ?Sized,
{
    for (index, column) in registry.columns().iter().enumerate() {
        let col = cast::usize_to_u16_column(index)?;
        backend.write_cell(
            ENUMERATION_SHEET_NAME,
            0,
            col,
            CellValue::Text(column.field.to_string()),
            None,
        )?;
        for (offset, code) in column.codes.iter().enumerate() {
            let row = cast::usize_to_u32_row(offset + 1)?;
            backend.write_cell(
                ENUMERATION_SHEET_NAME,
                row,
                col,
                CellValue::Text(code.clone()),
                None,
            )?;
        }
    }
    Ok(())
}
