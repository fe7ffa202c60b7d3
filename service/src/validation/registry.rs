use crate::generator::{cast, reference};
use schema_template_core::{FieldPath, Result};

/// Name of the hidden sheet holding list-validation sources
pub const ENUMERATION_SHEET_NAME: &str = "# Enums";

/// One column of the enumeration sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationColumn {
    /// Field the codes belong to; written as the column header
    pub field: FieldPath,
    /// Allowed codes, one per row below the header
    pub codes: Vec<String>,
}

/// Allocates enumeration-sheet columns in registration order
///
/// Column `n` holds the `n`th registered code list; its header is in row 1
/// and its codes in rows `2..=codes + 1`. A field that appears on several
/// sheets is registered once per appearance.
#[derive(Debug, Clone, Default)]
pub struct EnumerationRegistry {
    columns: Vec<EnumerationColumn>,
}

impl EnumerationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next column for `codes` and return the list source formula
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::WorkbookError` when the enumeration sheet has
    /// run out of columns or the code list out of rows.
    pub fn register(&mut self, field: &FieldPath, codes: Vec<String>) -> Result<String> {
        let column = cast::usize_to_u16_column(self.columns.len())?;
        let last_row = cast::usize_to_u32_row(codes.len())? + 1;
        let source = reference::absolute_column_range(ENUMERATION_SHEET_NAME, column, 2, last_row);

        tracing::trace!(field = %field, column, codes = codes.len(), "registered enumeration");
        self.columns.push(EnumerationColumn {
            field: field.clone(),
            codes,
        });
        Ok(source)
    }

    /// Columns in allocation order
    #[must_use]
    pub fn columns(&self) -> &[EnumerationColumn] {
        &self.columns
    }

    /// Number of allocated columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column has been allocated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_columns_allocated_in_order() {
        let mut registry = EnumerationRegistry::new();
        let first = registry
            .register(&FieldPath::new("category"), codes(&["a", "b", "c"]))
            .expect("first column");
        let second = registry
            .register(&FieldPath::new("status"), codes(&["x"]))
            .expect("second column");

        assert_eq!(first, "='# Enums'!$A$2:$A$4");
        assert_eq!(second, "='# Enums'!$B$2:$B$2");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.columns()[1].field, FieldPath::new("status"));
    }

    #[test]
    fn test_same_field_twice_gets_two_columns() {
        let mut registry = EnumerationRegistry::new();
        registry
            .register(&FieldPath::new("category"), codes(&["a"]))
            .expect("first");
        let again = registry
            .register(&FieldPath::new("category"), codes(&["a"]))
            .expect("second");
        assert_eq!(again, "='# Enums'!$B$2:$B$2");
    }
}
