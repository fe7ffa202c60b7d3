//! Error types for template generation

use thiserror::Error;

/// Main error type for template operations
#[derive(Error, Debug)]
pub enum TemplateError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Both `include_fields` and `exclude_fields` were configured
    #[error("Config file must specify at most one of `include_fields` and `exclude_fields`")]
    ConflictingFieldFilters,

    /// A field survived resolution but has no metadata record
    #[error("No field metadata for '{path}' (looked up as '{key}')")]
    MetadataMissing {
        /// Raw field path as it appears in the sheet
        path: String,
        /// Normalized key used for the lookup
        key: String,
    },

    /// Remote resource could not be fetched
    #[error("Failed to fetch '{url}': {reason}")]
    RemoteFetchError {
        /// URL that failed
        url: String,
        /// Reason for failure
        reason: String,
    },

    /// Codelist content could not be interpreted
    #[error("Invalid codelist '{codelist}': {reason}")]
    CodelistError {
        /// Codelist filename
        codelist: String,
        /// Reason for failure
        reason: String,
    },

    /// The flattening collaborator failed or produced unusable output
    #[error("Flattening failed: {0}")]
    FlattenError(String),

    /// Field metadata could not be loaded
    #[error("Field metadata error: {0}")]
    MetadataError(String),

    /// The workbook back end rejected an operation
    #[error("Workbook error: {0}")]
    WorkbookError(String),

    /// IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic errors with context
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

/// Result type alias for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Coarse classification used when reporting failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised before any worksheet is laid out
    Configuration,
    /// A field path could not be matched to schema metadata
    Integrity,
    /// A remote codelist could not be retrieved or read
    RemoteFetch,
    /// Collaborator, IO or serialization failure
    Environment,
}

impl TemplateError {
    /// Create a new configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a missing-metadata error
    #[must_use]
    pub fn metadata_missing(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self::MetadataMissing {
            path: path.into(),
            key: key.into(),
        }
    }

    /// Create a remote fetch error
    #[must_use]
    pub fn remote_fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteFetchError {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a codelist error
    #[must_use]
    pub fn codelist(codelist: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CodelistError {
            codelist: codelist.into(),
            reason: reason.into(),
        }
    }

    /// Create a flattening error
    #[must_use]
    pub fn flatten(message: impl Into<String>) -> Self {
        Self::FlattenError(message.into())
    }

    /// Create a metadata loading error
    #[must_use]
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::MetadataError(message.into())
    }

    /// Create a workbook error
    #[must_use]
    pub fn workbook(message: impl Into<String>) -> Self {
        Self::WorkbookError(message.into())
    }

    /// Create a generic error
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
            source: None,
        }
    }

    /// Create a generic error with source
    #[must_use]
    pub fn other_with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Other {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify the error
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigError(_) | Self::ConflictingFieldFilters => ErrorCategory::Configuration,
            Self::MetadataMissing { .. } => ErrorCategory::Integrity,
            Self::RemoteFetchError { .. } | Self::CodelistError { .. } => {
                ErrorCategory::RemoteFetch
            }
            Self::FlattenError(_)
            | Self::MetadataError(_)
            | Self::WorkbookError(_)
            | Self::IoError(_)
            | Self::SerializationError(_)
            | Self::Other { .. } => ErrorCategory::Environment,
        }
    }
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for TemplateError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            TemplateError::ConflictingFieldFilters.category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            TemplateError::metadata_missing("parties/0/name", "parties/name").category(),
            ErrorCategory::Integrity
        );
        assert_eq!(
            TemplateError::remote_fetch("https://example.com/a.csv", "404").category(),
            ErrorCategory::RemoteFetch
        );
        assert_eq!(
            TemplateError::workbook("bad sheet name").category(),
            ErrorCategory::Environment
        );
    }

    #[test]
    fn test_other_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::InvalidInput, "bad template");
        let err = TemplateError::other_with_source("Invalid progress template", io);
        assert_eq!(err.to_string(), "Invalid progress template");
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("bad template")
        );
        assert!(TemplateError::other("plain").source().is_none());
    }

    #[test]
    fn test_metadata_missing_message() {
        let err = TemplateError::metadata_missing("parties/0/name", "parties/name");
        assert_eq!(
            err.to_string(),
            "No field metadata for 'parties/0/name' (looked up as 'parties/name')"
        );
    }
}
