use crate::backend::{CellStyle, CellValue, WorkbookBackend};
use schema_template_core::Result;

/// Number of header rows above the input rows
pub const HEADER_ROW_COUNT: u32 = 8;

/// Width of the label column
const LABEL_COLUMN_WIDTH: f64 = 11.0;

/// Rows of the header stack, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderRow {
    /// Field path
    Path,
    /// Field title
    Title,
    /// Field description
    Description,
    /// `Required` marker
    Required,
    /// JSON type
    Type,
    /// Allowed values
    Values,
    /// Codelist name or link
    Codelist,
    /// Input guidance
    InputGuidance,
}

impl HeaderRow {
    /// Every header row in order
    pub const ALL: [Self; 8] = [
        Self::Path,
        Self::Title,
        Self::Description,
        Self::Required,
        Self::Type,
        Self::Values,
        Self::Codelist,
        Self::InputGuidance,
    ];

    /// Row name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Title => "title",
            Self::Description => "description",
            Self::Required => "required",
            Self::Type => "type",
            Self::Values => "values",
            Self::Codelist => "codelist",
            Self::InputGuidance => "input guidance",
        }
    }

    /// Label written in column A
    #[must_use]
    pub fn label(self) -> String {
        format!("# {}", self.name())
    }

    /// Zero-based row index
    #[must_use]
    pub fn index(self) -> u32 {
        match self {
            Self::Path => 0,
            Self::Title => 1,
            Self::Description => 2,
            Self::Required => 3,
            Self::Type => 4,
            Self::Values => 5,
            Self::Codelist => 6,
            Self::InputGuidance => 7,
        }
    }

    /// Row height, where it differs from the default
    #[must_use]
    pub fn height(self) -> Option<f64> {
        match self {
            Self::Description | Self::Values => Some(30.0),
            Self::InputGuidance => Some(50.0),
            _ => None,
        }
    }

    /// Cell style; the codelist row looks like a link when codelists link to docs
    #[must_use]
    pub fn style(self, linked_codelists: bool) -> CellStyle {
        match self {
            Self::Path => CellStyle::HeaderPath,
            Self::Title => CellStyle::HeaderTitle,
            Self::Description | Self::Values => CellStyle::HeaderWrapped,
            Self::Required | Self::Type => CellStyle::HeaderSmall,
            Self::Codelist if linked_codelists => CellStyle::HeaderLink,
            Self::Codelist => CellStyle::HeaderLabel,
            Self::InputGuidance => CellStyle::HeaderGuidance,
        }
    }
}

/// Style the header rows of a sheet and write the labels in column A
pub(crate) fn write_header_column<B>(backend: &mut B, sheet: &str, linked_codelists: bool) -> Result<()>
where
    B: WorkbookBackend + ?Sized,
{
    for row in HeaderRow::ALL {
        backend.set_row(sheet, row.index(), row.height(), Some(row.style(linked_codelists)))?;
        backend.write_cell(
            sheet,
            row.index(),
            0,
            CellValue::Text(row.label()),
            Some(CellStyle::HeaderColumn),
        )?;
    }
    backend.set_column(sheet, 0, LABEL_COLUMN_WIDTH, Some(CellStyle::HeaderColumn))
}
