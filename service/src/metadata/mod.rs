//! Field metadata
//!
//! Metadata is keyed by [`MetadataKey`], the field path with array indices
//! removed. Configured source fields are overlaid on the schema-derived
//! records and win on conflict.

mod mapping_sheet;

pub use mapping_sheet::{MappingSheetCommand, MappingSheetFile, parse_mapping_sheet};

use async_trait::async_trait;
use indexmap::IndexMap;
use schema_template_core::{
    FieldMetadata, FieldPath, MetadataKey, Result, TemplateConfig, TemplateError,
};
use std::path::Path;

/// Metadata records for every field of a schema
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataCatalog {
    fields: IndexMap<MetadataKey, FieldMetadata>,
}

impl MetadataCatalog {
    /// Create a catalog from keyed records
    #[must_use]
    pub fn new(fields: IndexMap<MetadataKey, FieldMetadata>) -> Self {
        Self { fields }
    }

    /// Create a catalog from `(path, metadata)` pairs; paths are normalized
    #[must_use]
    pub fn from_entries<P, I>(entries: I) -> Self
    where
        P: AsRef<str>,
        I: IntoIterator<Item = (P, FieldMetadata)>,
    {
        let fields = entries
            .into_iter()
            .map(|(path, metadata)| (MetadataKey::new(path.as_ref()), metadata))
            .collect();
        Self { fields }
    }

    /// Add or replace a record
    pub fn insert(&mut self, key: MetadataKey, metadata: FieldMetadata) {
        self.fields.insert(key, metadata);
    }

    /// Overlay the configured source fields
    #[must_use]
    pub fn with_source_fields(mut self, config: &TemplateConfig) -> Self {
        for (path, field) in config.source_field_paths() {
            self.fields
                .insert(path.metadata_key(), field.metadata.clone());
        }
        self
    }

    /// Metadata for a field path
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::MetadataMissing` if no record matches.
    pub fn lookup(&self, path: &FieldPath) -> Result<&FieldMetadata> {
        let key = path.metadata_key();
        self.fields
            .get(&key)
            .ok_or_else(|| TemplateError::metadata_missing(path.as_str(), key.as_str()))
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Loads field metadata for a schema
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Load metadata for every field of the schema
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::MetadataError` if the metadata cannot be
    /// produced or read.
    async fn load(&self, schema_path: &Path) -> Result<MetadataCatalog>;
}
