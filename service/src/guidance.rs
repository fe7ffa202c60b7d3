//! Input guidance shown in the last header row of each column

use schema_template_core::{FieldMetadata, FieldPath};

/// Guidance for multi-valued fields drawn from a list of codes
pub const CODED_ARRAY_GUIDANCE: &str = "Select from list or enter multiple values as a semicolon-separated list, e.g. a;b;c. Each value must be a code from the codelist.";

/// Guidance for other multi-valued fields
pub const ARRAY_GUIDANCE: &str = "Enter multiple values as a semicolon-separated list, e.g. a;b;c. Values must not contain semicolons or commas.";

/// Guidance for geometry fields entered as well-known text
pub const WKT_GUIDANCE: &str = "Enter a well-known text value, e.g. POLYGON ((30 10, 40 40, 20 40, 10 20, 30 10)). For more information on the well-known text representation of geometry, see https://en.wikipedia.org/wiki/Well-known_text_representation_of_geometry.";

/// Final path segment of geometry fields
const GEOMETRY_SEGMENT: &str = "geometry";

/// Guidance for one field.
///
/// Configured guidance is the starting point. Array fields and, with
/// well-known-text conversion on, geometry fields replace it with fixed
/// entry instructions.
#[must_use]
pub fn synthesize(
    path: &FieldPath,
    metadata: &FieldMetadata,
    field_guidance: Option<&str>,
    convert_wkt: bool,
) -> String {
    if metadata.data_type.is_array() {
        if metadata.domain().is_coded() {
            CODED_ARRAY_GUIDANCE.to_string()
        } else {
            ARRAY_GUIDANCE.to_string()
        }
    } else if convert_wkt && path.last_segment() == GEOMETRY_SEGMENT {
        WKT_GUIDANCE.to_string()
    } else {
        field_guidance.unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema_template_core::FieldType;

    fn metadata(data_type: FieldType, values: &str) -> FieldMetadata {
        FieldMetadata {
            data_type,
            values: values.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_configured_guidance() {
        let guidance = synthesize(
            &FieldPath::new("title"),
            &metadata(FieldType::String, ""),
            Some("Use the official title"),
            true,
        );
        assert_eq!(guidance, "Use the official title");
    }

    #[test]
    fn test_array_replaces_configured_guidance() {
        let guidance = synthesize(
            &FieldPath::new("tags"),
            &metadata(FieldType::Array, ""),
            Some("ignored"),
            true,
        );
        assert_eq!(guidance, ARRAY_GUIDANCE);
    }

    #[test]
    fn test_coded_array() {
        for values in ["Enum: a, b", "Codelist"] {
            let guidance = synthesize(
                &FieldPath::new("roles"),
                &metadata(FieldType::Array, values),
                None,
                true,
            );
            assert_eq!(guidance, CODED_ARRAY_GUIDANCE);
        }
    }

    #[test]
    fn test_geometry_depends_on_wkt() {
        let path = FieldPath::new("features/0/geometry");
        let field = metadata(FieldType::Object, "");
        assert_eq!(synthesize(&path, &field, Some("Draw it"), true), WKT_GUIDANCE);
        assert_eq!(synthesize(&path, &field, Some("Draw it"), false), "Draw it");
    }

    #[test]
    fn test_no_guidance() {
        let guidance = synthesize(&FieldPath::new("id"), &metadata(FieldType::String, ""), None, true);
        assert!(guidance.is_empty());
    }
}
