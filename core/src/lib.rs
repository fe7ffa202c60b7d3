//! # Schema Template Core
//!
//! Core types for building spreadsheet data-entry templates from a flattened
//! JSON Schema.
//!
//! This crate holds what the layout engine and its collaborators share:
//! field paths and metadata records, the YAML configuration model, and the
//! error taxonomy.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Core error types for template operations
pub mod error;

/// Data model for fields, metadata and configured scalars
pub mod types;

/// YAML configuration model and loader
pub mod config;

pub use config::{SourceFieldConfig, TemplateConfig, load_config};
pub use error::{ErrorCategory, Result, TemplateError};
pub use types::{FieldMetadata, FieldPath, FieldType, MetadataKey, ScalarValue, ValueDomain};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{SourceFieldConfig, TemplateConfig};
    pub use crate::error::{Result, TemplateError};
    pub use crate::types::*;
}
