use super::header::{HEADER_ROW_COUNT, HeaderRow};
use super::reference;
use crate::backend::{CellRange, CellStyle, CellValue, InputFormat, WorkbookBackend};
use crate::validation::ValidationRule;
use schema_template_core::{FieldMetadata, FieldPath, FieldType, Result, TemplateConfig};

/// Name of the helper sheet that links each main-sheet row to the schema
pub const LINKS_SHEET_NAME: &str = "links";

const LINKS_HREF: &str = "links/0/href";
const LINKS_REL: &str = "links/0/rel";
const DESCRIBED_BY: &str = "describedby";

/// Column holding each row's anchor value (the first field column)
const ANCHOR_COLUMN: u16 = 1;

const MIN_COLUMN_WIDTH: usize = 16;
const MAX_COLUMN_WIDTH: usize = 255;

/// What a sheet is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SheetRole {
    /// Ordinary data-entry sheet
    Data,
    /// Helper sheet filled by formulas
    Links,
}

impl SheetRole {
    pub(crate) fn of(sheet: &str) -> Self {
        if sheet == LINKS_SHEET_NAME {
            Self::Links
        } else {
            Self::Data
        }
    }
}

/// Per-sheet settings shared by every column
pub(crate) struct SheetContext<'a> {
    pub sheet: &'a str,
    pub role: SheetRole,
    pub input_rows: u32,
    pub main_sheet: &'a str,
    pub docs_url: Option<&'a str>,
    pub schema_url: Option<&'a str>,
}

/// One field ready to be written
pub(crate) struct FieldColumn<'a> {
    pub path: &'a FieldPath,
    pub metadata: &'a FieldMetadata,
    pub guidance: String,
    pub rule: Option<ValidationRule>,
}

/// How a column's input rows are filled
#[derive(Debug, Clone, PartialEq, Eq)]
enum InputCells<'a> {
    /// A literal shown whenever the row's anchor cell is filled
    AnchoredLiteral(String),
    /// A user formula with `{row}` placeholders
    Template(&'a str),
    /// The identifier of the same row on the main sheet
    MainIdentifier(String),
    /// Empty cells
    Blank,
}

impl<'a> InputCells<'a> {
    /// First match wins: fixed value, formula, links-sheet reserved path, blank
    fn for_field(ctx: &SheetContext<'_>, config: &'a TemplateConfig, path: &FieldPath) -> Self {
        if let Some(value) = config.fixed_values.get(path) {
            return Self::AnchoredLiteral(value.to_string());
        }
        if let Some(template) = config.formulae.get(path) {
            return Self::Template(template);
        }
        if ctx.role == SheetRole::Links {
            if path.is_identifier() {
                return Self::MainIdentifier(reference::quote_sheet_name(ctx.main_sheet).into_owned());
            }
            if path == LINKS_HREF {
                if let Some(schema_url) = ctx.schema_url {
                    return Self::AnchoredLiteral(schema_url.to_string());
                }
            } else if path == LINKS_REL {
                return Self::AnchoredLiteral(DESCRIBED_BY.to_string());
            }
        }
        Self::Blank
    }

    /// Formula for a one-based row number
    fn formula(&self, row: u32) -> Option<String> {
        match self {
            Self::AnchoredLiteral(literal) => Some(format!(
                "=IF({anchor}=\"\",\"\",\"{}\")",
                literal.replace('"', "\"\""),
                anchor = reference::cell(ANCHOR_COLUMN, row),
            )),
            Self::Template(template) => Some(template.replace("{row}", &row.to_string())),
            Self::MainIdentifier(main) => {
                let anchor = reference::cell(ANCHOR_COLUMN, row);
                Some(format!("=IF(ISBLANK({main}!{anchor}),\"\",{main}!{anchor})"))
            }
            Self::Blank => None,
        }
    }
}

/// Number format for a column's input cells
pub(crate) fn input_format(role: SheetRole, metadata: &FieldMetadata) -> InputFormat {
    if role == SheetRole::Links {
        InputFormat::Unformatted
    } else if metadata.is_date() {
        InputFormat::Date
    } else if metadata.data_type == FieldType::Number {
        InputFormat::Number
    } else if metadata.data_type.is_text_like() {
        InputFormat::Text
    } else {
        InputFormat::General
    }
}

/// Codelist header cell: a docs hyperlink, a plain label, or nothing
fn codelist_header(metadata: &FieldMetadata, docs_url: Option<&str>) -> CellValue {
    match (metadata.codelist_name(), docs_url) {
        (Some(name), Some(docs_url)) => CellValue::Formula(format!(
            "=HYPERLINK(\"{docs_url}#{}\",\"{name}\")",
            name.replace('_', "-")
        )),
        (Some(name), None) => CellValue::Formula(format!("=\"{name}\"")),
        (None, _) => CellValue::Blank,
    }
}

fn header_value(row: HeaderRow, field: &FieldColumn<'_>, docs_url: Option<&str>) -> CellValue {
    let metadata = field.metadata;
    match row {
        HeaderRow::Path => CellValue::Text(field.path.to_string()),
        HeaderRow::Title => CellValue::text_or_blank(&metadata.title),
        HeaderRow::Description => CellValue::text_or_blank(&metadata.description),
        HeaderRow::Required => {
            CellValue::text_or_blank(if metadata.required() { "Required" } else { "" })
        }
        HeaderRow::Type => CellValue::text_or_blank(metadata.data_type.as_str()),
        HeaderRow::Values => CellValue::text_or_blank(&metadata.values),
        HeaderRow::Codelist => codelist_header(metadata, docs_url),
        HeaderRow::InputGuidance => CellValue::text_or_blank(&field.guidance),
    }
}

fn column_width(path: &FieldPath) -> f64 {
    let width = path.char_len().clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
    u8::try_from(width).map_or(255.0, f64::from)
}

/// Write one field's header stack, input cells, width and validation
pub(crate) fn write_column<B>(
    backend: &mut B,
    ctx: &SheetContext<'_>,
    config: &TemplateConfig,
    col: u16,
    field: &FieldColumn<'_>,
) -> Result<()>
where
    B: WorkbookBackend + ?Sized,
{
    let linked = ctx.docs_url.is_some();
    for row in HeaderRow::ALL {
        backend.write_cell(
            ctx.sheet,
            row.index(),
            col,
            header_value(row, field, ctx.docs_url),
            Some(row.style(linked)),
        )?;
    }

    let style = CellStyle::Input(input_format(ctx.role, field.metadata));
    let cells = InputCells::for_field(ctx, config, field.path);
    for offset in 0..ctx.input_rows {
        let row = HEADER_ROW_COUNT + offset;
        let value = cells
            .formula(row + 1)
            .map_or(CellValue::Blank, CellValue::Formula);
        backend.write_cell(ctx.sheet, row, col, value, Some(style))?;
    }

    backend.set_column(ctx.sheet, col, column_width(field.path), None)?;

    if let Some(rule) = &field.rule {
        let last_row = HEADER_ROW_COUNT + ctx.input_rows.saturating_sub(1);
        backend.add_validation(
            ctx.sheet,
            CellRange::column(col, HEADER_ROW_COUNT, last_row),
            rule,
        )?;
    }
    Ok(())
}
