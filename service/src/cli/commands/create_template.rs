//! `create-template` command implementation
//!
//! Generates a spreadsheet template from a JSON Schema, with option values
//! taken from the command line first, then the configuration file, then the
//! built-in defaults.

use crate::cli::types::CreateTemplateArgs;
use crate::flatten::{CsvDirectory, FlattenToolCommand, Flattener};
use crate::generator::TemplateGenerator;
use crate::metadata::{MappingSheetCommand, MappingSheetFile, MetadataSource};
use crate::pipeline::{TemplatePipeline, TemplateSummary};
use crate::validation::{CachingCodelistSource, HttpCodelistSource};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use schema_template_core::config::{
    DEFAULT_INPUT_ROWS, DEFAULT_MAIN_SHEET_NAME, DEFAULT_OUTPUT_FILE, DEFAULT_TRUNCATION_LENGTH,
};
use schema_template_core::{Result, TemplateConfig, TemplateError, load_config};
use std::path::PathBuf;
use std::time::Duration;

/// Option values after precedence has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Template path
    pub output_file: PathBuf,
    /// Base URL of codelist CSV files
    pub codelist_base_url: Option<String>,
    /// Base URL of codelist documentation
    pub codelist_docs_url: Option<String>,
    /// Well-known-text geometry
    pub wkt: bool,
    /// Input rows per sheet
    pub input_rows: u32,
    /// Main sheet name
    pub main_sheet_name: String,
    /// Sheet-name component length
    pub truncation_length: usize,
    /// Roll-up of child-sheet columns
    pub rollup: bool,
}

impl ResolvedOptions {
    /// Read options from a configuration, filling gaps with defaults
    #[must_use]
    pub fn from_config(config: &TemplateConfig) -> Self {
        Self {
            output_file: PathBuf::from(
                config
                    .output_file
                    .as_deref()
                    .unwrap_or(DEFAULT_OUTPUT_FILE),
            ),
            codelist_base_url: config.codelist_base_url.clone(),
            codelist_docs_url: config.codelist_docs_url.clone(),
            wkt: config.wkt.unwrap_or(true),
            input_rows: config.input_rows.unwrap_or(DEFAULT_INPUT_ROWS),
            main_sheet_name: config
                .main_sheet_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MAIN_SHEET_NAME.to_string()),
            truncation_length: config
                .truncation_length
                .unwrap_or(DEFAULT_TRUNCATION_LENGTH),
            rollup: config.rollup.unwrap_or(false),
        }
    }
}

/// Command for generating a spreadsheet template
pub struct CreateTemplateCommand {
    /// Parsed arguments
    pub args: CreateTemplateArgs,
    /// Show progress indicators
    pub progress: bool,
    /// Verbose output
    pub verbose: bool,
}

impl CreateTemplateCommand {
    /// Create a new create-template command
    #[must_use]
    pub fn new(args: CreateTemplateArgs) -> Self {
        Self {
            args,
            progress: true,
            verbose: false,
        }
    }

    /// Set progress indicator visibility
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Set verbose output
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Write the options given on the command line over the configuration
    #[must_use]
    pub fn apply_overrides(&self, mut config: TemplateConfig) -> TemplateConfig {
        let args = &self.args;
        if let Some(output_file) = &args.output_file {
            config.output_file = Some(output_file.to_string_lossy().into_owned());
        }
        if args.codelist_base_url.is_some() {
            config.codelist_base_url.clone_from(&args.codelist_base_url);
        }
        if args.codelist_docs_url.is_some() {
            config.codelist_docs_url.clone_from(&args.codelist_docs_url);
        }
        if args.no_wkt {
            config.wkt = Some(false);
        } else if args.wkt {
            config.wkt = Some(true);
        }
        if args.input_rows.is_some() {
            config.input_rows = args.input_rows;
        }
        if args.main_sheet_name.is_some() {
            config.main_sheet_name.clone_from(&args.main_sheet_name);
        }
        if args.truncation_length.is_some() {
            config.truncation_length = args.truncation_length;
        }
        if args.rollup {
            config.rollup = Some(true);
        }
        config
    }

    /// Configuration file merged with command-line options, validated
    ///
    /// # Errors
    ///
    /// Returns configuration errors from loading or validation.
    pub fn effective_config(&self) -> Result<TemplateConfig> {
        let config = match &self.args.config_file {
            Some(path) => load_config(path)?,
            None => TemplateConfig::default(),
        };
        let config = self.apply_overrides(config);
        config.validate()?;
        Ok(config)
    }

    fn pipeline(&self, options: &ResolvedOptions) -> TemplatePipeline {
        let flattener: Box<dyn Flattener> = match &self.args.flattened_dir {
            Some(directory) => Box::new(CsvDirectory::new(directory)),
            None => Box::new(FlattenToolCommand::new()),
        };
        let metadata: Box<dyn MetadataSource> = match &self.args.field_metadata {
            Some(path) => Box::new(MappingSheetFile::new(path)),
            None => Box::new(MappingSheetCommand::new()),
        };
        let generator = TemplateGenerator::new()
            .with_main_sheet_name(options.main_sheet_name.clone())
            .with_input_rows(options.input_rows)
            .with_codelist_docs_url(options.codelist_docs_url.clone())
            .with_wkt(options.wkt);

        let pipeline = TemplatePipeline::new(flattener, metadata, generator)
            .with_truncation_length(options.truncation_length)
            .with_rollup(options.rollup);
        match &options.codelist_base_url {
            Some(base_url) => pipeline.with_codelists(Box::new(CachingCodelistSource::new(
                HttpCodelistSource::new(base_url.clone()),
            ))),
            None => pipeline,
        }
    }

    fn spinner(&self) -> Result<Option<ProgressBar>> {
        if !self.progress {
            return Ok(None);
        }
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .map_err(|e| TemplateError::other_with_source("Invalid progress template", e))?;
        let spinner = ProgressBar::new_spinner().with_style(style);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Ok(Some(spinner))
    }

    /// Execute the command
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Schema file doesn't exist
    /// - Configuration is invalid
    /// - Flattening, metadata loading or codelist retrieval fails
    /// - A field has no metadata
    /// - The template can't be written
    pub async fn execute(&self) -> Result<TemplateSummary> {
        if !self.args.schemafile.exists() {
            return Err(TemplateError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Schema file not found: {}", self.args.schemafile.display()),
            )));
        }

        let config = self.effective_config()?;
        let options = ResolvedOptions::from_config(&config);
        let mut pipeline = self.pipeline(&options);

        let spinner = self.spinner()?;
        if let Some(spinner) = &spinner {
            spinner.set_message(format!(
                "Generating template from {}...",
                self.args.schemafile.display()
            ));
        }

        let result = pipeline
            .run(&self.args.schemafile, &config, &options.output_file)
            .await;

        match (&spinner, &result) {
            (Some(spinner), Ok(_)) => spinner.finish_with_message(format!(
                "✓ Template generated: {}",
                options.output_file.display()
            )),
            (Some(spinner), Err(_)) => spinner.abandon(),
            (None, _) => {}
        }
        let summary = result?;

        self.report(&summary, &options);
        Ok(summary)
    }

    fn report(&self, summary: &TemplateSummary, options: &ResolvedOptions) {
        for warning in &summary.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
        if self.verbose {
            eprintln!("\n{}", "Template Summary:".bold());
            eprintln!("  Sheets: {}", summary.layout.sheets.join(", "));
            eprintln!("  Columns: {}", summary.layout.columns);
            eprintln!("  Enumerations: {}", summary.layout.enumeration_columns);
            if !summary.skipped.is_empty() {
                eprintln!("  Skipped: {}", summary.skipped.join(", "));
            }
            eprintln!("  Input rows: {}", options.input_rows);
            eprintln!(
                "  Codelists: {}",
                options
                    .codelist_base_url
                    .as_deref()
                    .unwrap_or("embedded enumerations only")
            );
        }
    }
}
