//! CLI type definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// `schema-template` command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "schema-template",
    version,
    about = "Spreadsheet data-entry templates from JSON Schema"
)]
pub struct TemplateCli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: TemplateCommand,
}

/// `schema-template` subcommands
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// Generate a spreadsheet template from a JSON Schema
    CreateTemplate(CreateTemplateArgs),
}

/// Arguments of `create-template`
///
/// Options left unset fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct CreateTemplateArgs {
    /// The JSON Schema file from which to generate the template
    pub schemafile: PathBuf,

    /// Read option defaults from the specified YAML file
    #[arg(short = 'c', long)]
    pub config_file: Option<PathBuf>,

    /// Path to which to write the template [default: template.xlsx]
    #[arg(short = 'o', long)]
    pub output_file: Option<PathBuf>,

    /// The base URL at which codelist CSV files are available
    #[arg(short = 'b', long)]
    pub codelist_base_url: Option<String>,

    /// The URL at which codelist documentation is available, with an HTML
    /// anchor per codelist
    #[arg(short = 'd', long)]
    pub codelist_docs_url: Option<String>,

    /// Use well-known text in place of GeoJSON geometry objects [default]
    #[arg(short = 'w', long, overrides_with = "no_wkt")]
    pub wkt: bool,

    /// Keep GeoJSON geometry objects
    #[arg(long, overrides_with = "wkt")]
    pub no_wkt: bool,

    /// The number of input rows [default: 1000]
    #[arg(short = 'i', long)]
    pub input_rows: Option<u32>,

    /// The name of the main (parent) sheet [default: main]
    #[arg(short = 'm', long)]
    pub main_sheet_name: Option<String>,

    /// The length of the components of sheet names [default: 10]
    #[arg(short = 't', long)]
    pub truncation_length: Option<usize>,

    /// Roll up columns from subsheets into the main sheet where the schema
    /// asks for it
    #[arg(short = 'r', long)]
    pub rollup: bool,

    /// Read field metadata from this mapping-sheet CSV instead of running ocdskit
    #[arg(long)]
    pub field_metadata: Option<PathBuf>,

    /// Read flattened CSV headers from this directory instead of running flatten-tool
    #[arg(long)]
    pub flattened_dir: Option<PathBuf>,
}
