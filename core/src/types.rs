//! Data model shared by the template generator and its collaborators

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Path segment that marks an array index in a flattened path
pub const ARRAY_INDEX_SEGMENT: &str = "0";

/// Prefix that marks a synthetic source field
pub const SOURCE_FIELD_PREFIX: &str = "# ";

/// Identifier field present on every flattened sheet
pub const IDENTIFIER_FIELD: &str = "id";

/// Marker that introduces an embedded enumeration in a value domain
const ENUM_MARKER: &str = "Enum";

/// Marker that introduces a codelist value domain
const CODELIST_MARKER: &str = "Codelist";

/// A `/`-delimited flattened field path such as `parties/0/name`.
///
/// The raw path (with array indices) identifies a spreadsheet column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(String);

impl FieldPath {
    /// Create a field path
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Create the synthetic path for a configured source field
    #[must_use]
    pub fn source_field(path: &str) -> Self {
        Self(format!("{SOURCE_FIELD_PREFIX}{path}"))
    }

    /// The path as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// The final path segment
    #[must_use]
    pub fn last_segment(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether this is a synthetic source field path
    #[must_use]
    pub fn is_source_field(&self) -> bool {
        self.0.starts_with(SOURCE_FIELD_PREFIX)
    }

    /// Whether this is the bare identifier field
    #[must_use]
    pub fn is_identifier(&self) -> bool {
        self.0 == IDENTIFIER_FIELD
    }

    /// Number of characters in the path
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    /// Metadata lookup key: the path with array-index segments removed
    #[must_use]
    pub fn metadata_key(&self) -> MetadataKey {
        let key = self
            .segments()
            .filter(|segment| *segment != ARRAY_INDEX_SEGMENT)
            .collect::<Vec<_>>()
            .join("/");
        MetadataKey(key)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self(path)
    }
}

impl Borrow<str> for FieldPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FieldPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FieldPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A field path with array indices removed, as used by the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataKey(String);

impl MetadataKey {
    /// Create a metadata key, normalizing away any array-index segments
    #[must_use]
    pub fn new(key: &str) -> Self {
        FieldPath::new(key).metadata_key()
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MetadataKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// JSON type of a field as reported by the metadata service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    /// `string`
    String,
    /// `number`
    Number,
    /// `integer`
    Integer,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
    /// No type reported
    #[default]
    Unspecified,
    /// Any other type label, kept verbatim
    Other(String),
}

impl FieldType {
    /// Parse a type label
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim() {
            "string" => Self::String,
            "number" => Self::Number,
            "integer" => Self::Integer,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            "" => Self::Unspecified,
            other => Self::Other(other.to_string()),
        }
    }

    /// The type label as written in the header row
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Unspecified => "",
            Self::Other(label) => label,
        }
    }

    /// Whether values of this type are entered as a semicolon-separated list
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array)
    }

    /// Whether input cells should be forced to text
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::String | Self::Array | Self::Object)
    }
}

impl From<String> for FieldType {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpretation of a field's `values` description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDomain {
    /// No constraint described
    Unconstrained,
    /// A calendar date
    Date,
    /// Codes embedded in the schema (`Enum: a, b, c`)
    Enumerated(Vec<String>),
    /// Values drawn from an external codelist
    Codelist,
    /// Any other free-text description
    Described(String),
}

impl ValueDomain {
    /// Parse a `values` description
    #[must_use]
    pub fn parse(values: &str) -> Self {
        if values.is_empty() {
            Self::Unconstrained
        } else if values == "date" {
            Self::Date
        } else if let Some(rest) = values.strip_prefix(ENUM_MARKER) {
            let codes = rest
                .trim_start_matches(':')
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(ToString::to_string)
                .collect();
            Self::Enumerated(codes)
        } else if values.starts_with(CODELIST_MARKER) {
            Self::Codelist
        } else {
            Self::Described(values.to_string())
        }
    }

    /// Whether the domain is a list of codes, embedded or external
    #[must_use]
    pub fn is_coded(&self) -> bool {
        matches!(self, Self::Enumerated(_) | Self::Codelist)
    }
}

/// Descriptive metadata for one field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMetadata {
    /// Human-readable title
    pub title: String,

    /// Description
    pub description: String,

    /// JSON type
    #[serde(rename = "type")]
    pub data_type: FieldType,

    /// Cardinality range such as `0..1` or `1..n`
    pub range: String,

    /// Description of the allowed value domain
    pub values: String,

    /// Codelist filename, such as `partyRole.csv`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codelist: Option<String>,
}

impl FieldMetadata {
    /// Whether the cardinality range has a lower bound of one
    #[must_use]
    pub fn required(&self) -> bool {
        self.range.starts_with('1')
    }

    /// Interpreted value domain
    #[must_use]
    pub fn domain(&self) -> ValueDomain {
        ValueDomain::parse(&self.values)
    }

    /// Whether the value domain is a calendar date
    #[must_use]
    pub fn is_date(&self) -> bool {
        self.values == "date"
    }

    /// Codelist filename without its extension
    #[must_use]
    pub fn codelist_name(&self) -> Option<&str> {
        self.codelist
            .as_deref()
            .filter(|codelist| !codelist.is_empty())
            .map(|codelist| codelist.split('.').next().unwrap_or(codelist))
    }
}

/// A YAML scalar supplied through configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    Text(String),
}

impl ScalarValue {
    /// Numeric value, if the scalar is a number
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
