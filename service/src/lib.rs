//! # Schema Template Service
//!
//! Builds spreadsheet data-entry templates from a JSON Schema.
//!
//! The schema is flattened into one field-path header per logical sheet by
//! an external flattening tool. This crate turns those headers, together
//! with per-field metadata and user overrides, into a workbook with:
//!
//! - a fixed stack of header rows describing every column
//! - typed input cells for a configurable number of rows
//! - fixed-value, user-supplied and cross-sheet formulas
//! - list validation backed by a hidden enumeration sheet, and date validation
//! - hidden configuration and helper sheets consumed when the template is
//!   flattened back into structured data
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use schema_template_service::backend::MemoryWorkbook;
//! use schema_template_service::flatten::FlattenedSheets;
//! use schema_template_service::generator::TemplateGenerator;
//! use schema_template_service::metadata::MetadataCatalog;
//! use schema_template_service::resolver::FieldResolver;
//! use schema_template_core::prelude::*;
//!
//! # async fn demo() -> schema_template_core::Result<()> {
//! let mut flattened = FlattenedSheets::new();
//! flattened.insert("main", vec![FieldPath::new("id"), FieldPath::new("title")]);
//!
//! let catalog = MetadataCatalog::from_entries([
//!     ("id", FieldMetadata { data_type: FieldType::String, ..Default::default() }),
//!     ("title", FieldMetadata { data_type: FieldType::String, ..Default::default() }),
//! ]);
//!
//! let config = TemplateConfig::default();
//! let sheets = FieldResolver::new(&config).resolve(&flattened)?;
//!
//! let mut workbook = MemoryWorkbook::new();
//! TemplateGenerator::new()
//!     .build(&mut workbook, &catalog, &sheets, &config, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cli;
pub mod flatten;
pub mod generator;
pub mod guidance;
pub mod metadata;
pub mod pipeline;
pub mod resolver;
pub mod validation;

pub use schema_template_core::{Result, TemplateConfig, TemplateError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::{MemoryWorkbook, WorkbookBackend, XlsxBackend};
    pub use crate::flatten::{FlattenRequest, FlattenedSheets, Flattener};
    pub use crate::generator::{LayoutReport, TemplateFeatures, TemplateGenerator};
    pub use crate::metadata::{MetadataCatalog, MetadataSource};
    pub use crate::pipeline::{TemplatePipeline, TemplateSummary};
    pub use crate::resolver::{FieldResolver, ResolvedSheets, SheetMismatch};
    pub use crate::validation::{CodelistSource, EnumerationRegistry, ValidationRule};
    pub use schema_template_core::prelude::*;
}
