//! End-to-end template generation
//!
//! [`TemplatePipeline`] flattens the schema, loads field metadata, resolves
//! sheets, lays the template out and writes it. Stages run strictly in
//! order; the output file only appears once every stage has succeeded.

use crate::backend::{WorkbookBackend, XlsxBackend};
use crate::flatten::{FlattenRequest, Flattener};
use crate::generator::{LayoutReport, TemplateFeatures, TemplateGenerator};
use crate::metadata::MetadataSource;
use crate::resolver::{FieldResolver, SheetMismatch};
use crate::validation::CodelistSource;
use schema_template_core::config::DEFAULT_TRUNCATION_LENGTH;
use schema_template_core::{Result, TemplateConfig, TemplateError};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineStage {
    /// Nothing has run yet
    Init,
    /// The schema has been flattened
    FlattenInvoked,
    /// Sheets and fields have been resolved
    SheetsResolved,
    /// Sheets are being laid out
    PerSheetLayout,
    /// The workbook has been serialized
    Finalized,
}

impl PipelineStage {
    /// The stage that follows this one
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::FlattenInvoked),
            Self::FlattenInvoked => Some(Self::SheetsResolved),
            Self::SheetsResolved => Some(Self::PerSheetLayout),
            Self::PerSheetLayout => Some(Self::Finalized),
            Self::Finalized => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::FlattenInvoked => "flattened",
            Self::SheetsResolved => "sheets resolved",
            Self::PerSheetLayout => "laying out",
            Self::Finalized => "finalized",
        };
        f.write_str(label)
    }
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateSummary {
    /// Written file, when the run produced one
    pub output: Option<PathBuf>,
    /// Layout outcome
    pub layout: LayoutReport,
    /// Sheets skipped for having no fields to enter
    pub skipped: Vec<String>,
    /// Sheet selection warnings
    pub warnings: Vec<SheetMismatch>,
}

/// Read the schema's `$id`, the URL written to the links sheet
///
/// # Errors
///
/// Returns `TemplateError::IoError` if the schema cannot be read and
/// `TemplateError::SerializationError` if it is not JSON.
pub async fn read_schema_url(schema_path: &Path) -> Result<Option<String>> {
    let content = tokio::fs::read(schema_path).await?;
    let schema: serde_json::Value = serde_json::from_slice(&content)?;
    Ok(schema
        .get("$id")
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string))
}

/// Runs flattening, metadata loading, resolution and layout in sequence
pub struct TemplatePipeline {
    flattener: Box<dyn Flattener>,
    metadata: Box<dyn MetadataSource>,
    codelists: Option<Box<dyn CodelistSource>>,
    generator: TemplateGenerator,
    truncation_length: usize,
    rollup: bool,
    stage: PipelineStage,
}

impl TemplatePipeline {
    /// Create a pipeline from its collaborators
    #[must_use]
    pub fn new(
        flattener: Box<dyn Flattener>,
        metadata: Box<dyn MetadataSource>,
        generator: TemplateGenerator,
    ) -> Self {
        Self {
            flattener,
            metadata,
            codelists: None,
            generator,
            truncation_length: DEFAULT_TRUNCATION_LENGTH,
            rollup: false,
            stage: PipelineStage::Init,
        }
    }

    /// Fetch codelists for list validation
    #[must_use]
    pub fn with_codelists(mut self, codelists: Box<dyn CodelistSource>) -> Self {
        self.codelists = Some(codelists);
        self
    }

    /// Set the sheet-name truncation length passed to the flattener
    #[must_use]
    pub fn with_truncation_length(mut self, length: usize) -> Self {
        self.truncation_length = length;
        self
    }

    /// Roll child-sheet fields up into the main sheet
    #[must_use]
    pub fn with_rollup(mut self, enabled: bool) -> Self {
        self.rollup = enabled;
        self
    }

    /// Current stage
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn advance(&mut self, to: PipelineStage) -> Result<()> {
        if self.stage.next() != Some(to) {
            return Err(TemplateError::other(format!(
                "pipeline cannot move from '{}' to '{to}'",
                self.stage
            )));
        }
        debug!(stage = %to, "pipeline stage");
        self.stage = to;
        Ok(())
    }

    fn flatten_request(&self, schema_path: &Path) -> FlattenRequest {
        let mut features = TemplateFeatures::NONE;
        features.set(TemplateFeatures::CONVERT_WKT, self.generator.convert_wkt());
        features.set(TemplateFeatures::ROLLUP, self.rollup);
        FlattenRequest {
            schema_path: schema_path.to_path_buf(),
            main_sheet_name: self.generator.main_sheet_name().to_string(),
            truncation_length: self.truncation_length,
            features,
        }
    }

    /// Run every stage up to layout, writing to `backend`
    ///
    /// Leaves the pipeline in [`PipelineStage::PerSheetLayout`].
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a collaborator or the layout engine.
    /// Configuration errors are raised before flattening starts.
    pub async fn build<B>(
        &mut self,
        schema_path: &Path,
        config: &TemplateConfig,
        backend: &mut B,
    ) -> Result<TemplateSummary>
    where
        B: WorkbookBackend + ?Sized,
    {
        self.stage = PipelineStage::Init;
        config.validate()?;

        let request = self.flatten_request(schema_path);
        let flattened = self.flattener.flatten(&request).await?;
        self.advance(PipelineStage::FlattenInvoked)?;
        info!(sheets = flattened.len(), "flattened schema");

        let catalog = self
            .metadata
            .load(schema_path)
            .await?
            .with_source_fields(config);
        let resolved = FieldResolver::new(config).resolve(&flattened)?;
        self.advance(PipelineStage::SheetsResolved)?;

        let generator = if self.generator.schema_url().is_some() {
            self.generator.clone()
        } else {
            let schema_url = read_schema_url(schema_path).await?;
            if schema_url.is_none() {
                warn!(schema = %schema_path.display(), "schema has no $id; links sheet hrefs left blank");
            }
            self.generator.clone().with_schema_url(schema_url)
        };

        self.advance(PipelineStage::PerSheetLayout)?;
        let layout = generator
            .build(
                backend,
                &catalog,
                &resolved,
                config,
                self.codelists.as_deref(),
            )
            .await?;

        Ok(TemplateSummary {
            output: None,
            layout,
            skipped: resolved.skipped,
            warnings: resolved.warnings,
        })
    }

    /// Run the whole pipeline and write the workbook to `output`
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any stage; `output` is left untouched.
    pub async fn run(
        &mut self,
        schema_path: &Path,
        config: &TemplateConfig,
        output: &Path,
    ) -> Result<TemplateSummary> {
        let mut backend = XlsxBackend::new();
        let mut summary = self.build(schema_path, config, &mut backend).await?;

        backend.save(output)?;
        self.advance(PipelineStage::Finalized)?;
        info!(output = %output.display(), "wrote template");

        summary.output = Some(output.to_path_buf());
        Ok(summary)
    }
}
