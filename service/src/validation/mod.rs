//! Input validation for template columns
//!
//! A column with a list of allowed codes gets list validation backed by a
//! column on the hidden enumeration sheet. Codes come either from the
//! field's embedded enumeration or from a [`CodelistSource`]. Date columns
//! get a lower-bounded date rule.

mod codelist;
mod registry;
mod rules;

pub use codelist::{
    CODE_COLUMN, CachingCodelistSource, CodelistSource, HttpCodelistSource, StaticCodelists,
    parse_codelist_csv,
};
pub use registry::{ENUMERATION_SHEET_NAME, EnumerationColumn, EnumerationRegistry};
pub use rules::{
    CODELIST_ERROR_TITLE, EMBEDDED_ARRAY_MESSAGE, EMBEDDED_SCALAR_MESSAGE, ErrorSeverity,
    FETCHED_ARRAY_MESSAGE, FETCHED_SCALAR_MESSAGE, MAX_VALIDATION_MESSAGE_LEN, RuleBuilder,
    ValidationRule, minimum_date,
};
