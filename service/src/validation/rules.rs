use super::codelist::CodelistSource;
use super::registry::EnumerationRegistry;
use chrono::NaiveDate;
use schema_template_core::{FieldMetadata, FieldPath, Result, TemplateError, ValueDomain};
use tracing::{debug, warn};

/// Longest error message a spreadsheet validation accepts
pub const MAX_VALIDATION_MESSAGE_LEN: usize = 255;

/// Error title shown when a value is not in the list
pub const CODELIST_ERROR_TITLE: &str = "Value not in codelist";

/// Embedded codes, multi-valued field
pub const EMBEDDED_ARRAY_MESSAGE: &str = "You must use a code from the codelist.\n\nIf no code is appropriate, please create an issue in the standard repository. If you entered multiple values from the codelist, you can ignore this warning.";

/// Embedded codes, single-valued field
pub const EMBEDDED_SCALAR_MESSAGE: &str = "You must use a code from the codelist.\n\nIf no code is appropriate, please create an issue in the standard.";

/// Fetched (open) codelist, multi-valued field
pub const FETCHED_ARRAY_MESSAGE: &str = "You must use a code from the codelist, unless no code is appropriate.\n\nIf you use codes outside this open codelist, please create an issue in the standard repository. If you entered multiple values from the codelist, you can ignore this warning.";

/// Fetched (open) codelist, single-valued field
pub const FETCHED_SCALAR_MESSAGE: &str = "You must use a code from the codelist, unless no code is appropriate.\n\nIf you use new codes outside those in an open codelist, please create an issue in the standard repository, so that the codes can be considered for inclusion in the codelist.";

/// What happens when an entered value fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// The value is rejected
    Stop,
    /// The user is warned but may keep the value
    Warning,
}

/// Data-validation constraint attached to a column's input rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Value must be one of the codes in a range of the enumeration sheet
    List {
        /// Range formula such as `='# Enums'!$A$2:$A$4`
        source: String,
        /// Error policy
        severity: ErrorSeverity,
        /// Title of the error dialog
        error_title: String,
        /// Body of the error dialog
        error_message: String,
    },
    /// Value must be a date on or after the bound
    DateOnOrAfter(NaiveDate),
}

/// Earliest date a spreadsheet date serial can represent
///
/// # Errors
///
/// Never fails in practice; the date is a valid calendar date.
pub fn minimum_date() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(1900, 1, 1)
        .ok_or_else(|| TemplateError::other("1900-01-01 is not a valid date"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeOrigin {
    Embedded,
    Fetched,
}

fn list_policy(origin: CodeOrigin, is_array: bool) -> (ErrorSeverity, &'static str) {
    match (origin, is_array) {
        (CodeOrigin::Embedded, true) => (ErrorSeverity::Warning, EMBEDDED_ARRAY_MESSAGE),
        (CodeOrigin::Embedded, false) => (ErrorSeverity::Stop, EMBEDDED_SCALAR_MESSAGE),
        (CodeOrigin::Fetched, true) => (ErrorSeverity::Warning, FETCHED_ARRAY_MESSAGE),
        (CodeOrigin::Fetched, false) => (ErrorSeverity::Warning, FETCHED_SCALAR_MESSAGE),
    }
}

/// Derives the validation rule for a field
///
/// Embedded enumerations are used as-is. A codelist reference is resolved
/// through the codelist source when one is configured; without a source,
/// codelist fields get no list validation.
pub struct RuleBuilder<'a> {
    codelists: Option<&'a dyn CodelistSource>,
}

impl<'a> RuleBuilder<'a> {
    /// Create a builder with an optional codelist source
    #[must_use]
    pub fn new(codelists: Option<&'a dyn CodelistSource>) -> Self {
        Self { codelists }
    }

    /// Build the rule for one field, registering its codes if it gets a list
    ///
    /// # Errors
    ///
    /// Returns `TemplateError::RemoteFetchError` or
    /// `TemplateError::CodelistError` if a codelist cannot be retrieved, and
    /// `TemplateError::WorkbookError` if the enumeration sheet is full.
    pub async fn build(
        &self,
        path: &FieldPath,
        metadata: &FieldMetadata,
        registry: &mut EnumerationRegistry,
    ) -> Result<Option<ValidationRule>> {
        let listed = match metadata.domain() {
            ValueDomain::Enumerated(codes) => Some((codes, CodeOrigin::Embedded)),
            _ => match (metadata.codelist.as_deref(), self.codelists) {
                (Some(codelist), Some(source)) if !codelist.is_empty() => {
                    Some((source.codes(codelist).await?, CodeOrigin::Fetched))
                }
                _ => None,
            },
        };

        if let Some((codes, origin)) = listed {
            if codes.is_empty() {
                warn!(field = %path, "code list is empty; no list validation added");
                return Ok(None);
            }
            let (severity, message) = list_policy(origin, metadata.data_type.is_array());
            let source = registry.register(path, codes)?;
            debug!(field = %path, %source, ?severity, "list validation");
            return Ok(Some(ValidationRule::List {
                source,
                severity,
                error_title: CODELIST_ERROR_TITLE.to_string(),
                error_message: message.to_string(),
            }));
        }

        if metadata.is_date() {
            debug!(field = %path, "date validation");
            return Ok(Some(ValidationRule::DateOnOrAfter(minimum_date()?)));
        }

        Ok(None)
    }
}
