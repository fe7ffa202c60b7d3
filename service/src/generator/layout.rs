use super::column::{self, FieldColumn, LINKS_SHEET_NAME, SheetContext, SheetRole};
use super::features::TemplateFeatures;
use super::header::{self, HEADER_ROW_COUNT};
use super::{cast, sheets};
use crate::backend::WorkbookBackend;
use crate::guidance;
use crate::metadata::MetadataCatalog;
use crate::resolver::{ResolvedSheet, ResolvedSheets};
use crate::validation::{CodelistSource, ENUMERATION_SHEET_NAME, EnumerationRegistry, RuleBuilder};
use schema_template_core::config::{DEFAULT_INPUT_ROWS, DEFAULT_MAIN_SHEET_NAME};
use schema_template_core::{Result, TemplateConfig, TemplateError};
use tracing::{debug, info, warn};

/// Template layout entry point.
#[derive(Debug, Clone)]
pub struct TemplateGenerator {
    /// Enabled features.
    features: TemplateFeatures,
    /// Name of the sheet activated when the workbook opens.
    main_sheet_name: String,
    /// Input rows per sheet.
    input_rows: u32,
    /// Base URL of the codelist documentation.
    codelist_docs_url: Option<String>,
    /// Schema URL written to the links sheet.
    schema_url: Option<String>,
}

/// What a layout run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    /// Data sheets laid out, in tab order
    pub sheets: Vec<String>,
    /// Columns written across all data sheets
    pub columns: usize,
    /// Enumeration columns allocated
    pub enumeration_columns: usize,
    /// Sheet activated on open, if the main sheet was laid out
    pub active_sheet: Option<String>,
}

impl TemplateGenerator {
    /// Create a generator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self {
            features: TemplateFeatures::DEFAULT,
            main_sheet_name: DEFAULT_MAIN_SHEET_NAME.to_string(),
            input_rows: DEFAULT_INPUT_ROWS,
            codelist_docs_url: None,
            schema_url: None,
        }
    }

    /// Set the main sheet name.
    #[must_use]
    pub fn with_main_sheet_name(mut self, name: impl Into<String>) -> Self {
        self.main_sheet_name = name.into();
        self
    }

    /// Set the number of input rows.
    #[must_use]
    pub fn with_input_rows(mut self, rows: u32) -> Self {
        self.input_rows = rows;
        self
    }

    /// Link codelist names to documentation under `url`.
    #[must_use]
    pub fn with_codelist_docs_url(mut self, url: Option<String>) -> Self {
        self.codelist_docs_url = url;
        self
    }

    /// Set the schema URL used on the links sheet.
    #[must_use]
    pub fn with_schema_url(mut self, url: Option<String>) -> Self {
        self.schema_url = url;
        self
    }

    /// Configure well-known-text guidance for geometry fields.
    #[must_use]
    pub fn with_wkt(mut self, enabled: bool) -> Self {
        self.features.set(TemplateFeatures::CONVERT_WKT, enabled);
        self
    }

    /// Configure header freezing.
    #[must_use]
    pub fn with_frozen_headers(mut self, enabled: bool) -> Self {
        self.features.set(TemplateFeatures::FREEZE_HEADERS, enabled);
        self
    }

    /// Check if well-known-text guidance is enabled.
    #[must_use]
    pub fn convert_wkt(&self) -> bool {
        self.features.contains(TemplateFeatures::CONVERT_WKT)
    }

    /// Check if header freezing is enabled.
    #[must_use]
    pub fn freeze_headers(&self) -> bool {
        self.features.contains(TemplateFeatures::FREEZE_HEADERS)
    }

    /// Main sheet name.
    #[must_use]
    pub fn main_sheet_name(&self) -> &str {
        &self.main_sheet_name
    }

    /// Number of input rows.
    #[must_use]
    pub fn input_rows(&self) -> u32 {
        self.input_rows
    }

    /// Schema URL used on the links sheet.
    #[must_use]
    pub fn schema_url(&self) -> Option<&str> {
        self.schema_url.as_deref()
    }

    /// Lay the resolved sheets out on `backend`.
    ///
    /// Tab order is the enumeration sheet, the configuration sheet, the
    /// variables sheet (when variables are configured), then the data
    /// sheets. Helper sheets end up hidden and the main sheet active.
    ///
    /// # Errors
    ///
    /// Returns configuration errors before any sheet is added, then
    /// `TemplateError::MetadataMissing` for a field without metadata,
    /// codelist errors, and back-end errors.
    pub async fn build<B>(
        &self,
        backend: &mut B,
        catalog: &MetadataCatalog,
        sheets: &ResolvedSheets,
        config: &TemplateConfig,
        codelists: Option<&dyn CodelistSource>,
    ) -> Result<LayoutReport>
    where
        B: WorkbookBackend + ?Sized,
    {
        config.validate()?;
        if self.input_rows == 0 {
            return Err(TemplateError::config("input_rows must be at least 1"));
        }
        let last_row = u64::from(HEADER_ROW_COUNT) + u64::from(self.input_rows) - 1;
        cast::usize_to_u32_row(usize::try_from(last_row).unwrap_or(usize::MAX))?;

        backend.add_sheet(ENUMERATION_SHEET_NAME)?;
        sheets::write_meta_sheet(backend, &config.package_metadata)?;
        if !config.variables.is_empty() {
            sheets::write_variables_sheet(backend, &config.variables)?;
        }

        let rules = RuleBuilder::new(codelists);
        let mut registry = EnumerationRegistry::new();
        let mut report = LayoutReport::default();
        for sheet in &sheets.sheets {
            report.columns += self
                .layout_sheet(backend, sheet, catalog, config, &rules, &mut registry)
                .await?;
            report.sheets.push(sheet.name.clone());
        }

        sheets::write_enumeration_sheet(backend, &registry)?;
        report.enumeration_columns = registry.len();
        report.active_sheet = self.finalize(backend)?;

        info!(
            sheets = report.sheets.len(),
            columns = report.columns,
            enumerations = report.enumeration_columns,
            "laid out template"
        );
        Ok(report)
    }

    /// Lay out one sheet, returning the number of field columns written
    async fn layout_sheet<B>(
        &self,
        backend: &mut B,
        sheet: &ResolvedSheet,
        catalog: &MetadataCatalog,
        config: &TemplateConfig,
        rules: &RuleBuilder<'_>,
        registry: &mut EnumerationRegistry,
    ) -> Result<usize>
    where
        B: WorkbookBackend + ?Sized,
    {
        debug!(sheet = %sheet.name, fields = sheet.fields.len(), "laying out sheet");
        backend.add_sheet(&sheet.name)?;
        if self.freeze_headers() {
            backend.freeze_panes(&sheet.name, 1, 1)?;
        }
        header::write_header_column(backend, &sheet.name, self.codelist_docs_url.is_some())?;

        let ctx = SheetContext {
            sheet: &sheet.name,
            role: SheetRole::of(&sheet.name),
            input_rows: self.input_rows,
            main_sheet: &self.main_sheet_name,
            docs_url: self.codelist_docs_url.as_deref(),
            schema_url: self.schema_url.as_deref(),
        };

        for (index, path) in sheet.fields.iter().enumerate() {
            let col = cast::usize_to_u16_column(index + 1)?;
            let metadata = catalog.lookup(path)?;
            let guidance = guidance::synthesize(
                path,
                metadata,
                config.field_guidance.get(path).map(String::as_str),
                self.convert_wkt(),
            );
            let rule = rules.build(path, metadata, registry).await?;
            column::write_column(
                backend,
                &ctx,
                config,
                col,
                &FieldColumn {
                    path,
                    metadata,
                    guidance,
                    rule,
                },
            )?;
        }
        Ok(sheet.fields.len())
    }

    /// Hide helper sheets and activate the main sheet
    fn finalize<B>(&self, backend: &mut B) -> Result<Option<String>>
    where
        B: WorkbookBackend + ?Sized,
    {
        backend.hide_sheet(ENUMERATION_SHEET_NAME)?;
        if backend.has_sheet(LINKS_SHEET_NAME) {
            backend.hide_sheet(LINKS_SHEET_NAME)?;
        }
        if backend.has_sheet(&self.main_sheet_name) {
            backend.activate_sheet(&self.main_sheet_name)?;
            Ok(Some(self.main_sheet_name.clone()))
        } else {
            warn!(
                sheet = %self.main_sheet_name,
                "main sheet was not laid out; no sheet activated"
            );
            Ok(None)
        }
    }
}

impl Default for TemplateGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_toggles() {
        let generator = TemplateGenerator::new();
        assert!(generator.convert_wkt());
        assert!(generator.freeze_headers());

        let generator = generator.with_wkt(false).with_frozen_headers(false);
        assert!(!generator.convert_wkt());
        assert!(!generator.freeze_headers());
    }

    #[test]
    fn test_defaults() {
        let generator = TemplateGenerator::default();
        assert_eq!(generator.main_sheet_name(), "main");
        assert_eq!(generator.input_rows(), 1000);
        assert_eq!(generator.schema_url(), None);
    }
}
