use crate::backend::{CellValue, WorkbookBackend};
use crate::generator::{HEADER_ROW_COUNT, cast};
use indexmap::IndexMap;
use schema_template_core::{Result, ScalarValue};

/// Name of the hidden configuration sheet read by the flattening tool
pub const META_SHEET_NAME: &str = "Meta";

/// Add the hidden configuration sheet.
///
/// Row 1 carries the flattening tool's configuration properties (comment
/// rows start with `#`; the header stack is skipped). Package metadata
/// follows as key/value pairs from row 2.
pub(crate) fn write_meta_sheet<B>(
    backend: &mut B,
    package_metadata: &IndexMap<String, ScalarValue>,
) -> Result<()>
where
    B: WorkbookBackend + ?Sized,
{
    backend.add_sheet(META_SHEET_NAME)?;
    backend.hide_sheet(META_SHEET_NAME)?;

    let properties = [
        "#".to_string(),
        "hashComments".to_string(),
        format!("HeaderRows {HEADER_ROW_COUNT}"),
    ];
    for (col, property) in (0u16..).zip(properties) {
        backend.write_cell(META_SHEET_NAME, 0, col, CellValue::Text(property), None)?;
    }

    for (index, (key, value)) in package_metadata.iter().enumerate() {
        let row = cast::usize_to_u32_row(index + 1)?;
        backend.write_cell(META_SHEET_NAME, row, 0, CellValue::Text(key.clone()), None)?;
        backend.write_cell(META_SHEET_NAME, row, 1, CellValue::from(value), None)?;
    }
    Ok(())
}
