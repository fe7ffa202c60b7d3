//! Integration tests for template layout against the in-memory workbook

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use schema_template_core::{FieldMetadata, FieldType, ScalarValue, TemplateConfig, TemplateError};
use schema_template_service::backend::{CellStyle, CellValue, InputFormat, MemoryWorkbook};
use schema_template_service::flatten::FlattenedSheets;
use schema_template_service::generator::{LayoutReport, TemplateGenerator};
use schema_template_service::guidance::{ARRAY_GUIDANCE, CODED_ARRAY_GUIDANCE, WKT_GUIDANCE};
use schema_template_service::metadata::MetadataCatalog;
use schema_template_service::resolver::{FieldResolver, ResolvedSheets};
use schema_template_service::validation::{
    CODELIST_ERROR_TITLE, EMBEDDED_SCALAR_MESSAGE, ErrorSeverity, FETCHED_ARRAY_MESSAGE,
    StaticCodelists, ValidationRule,
};

fn field(title: &str, data_type: FieldType, range: &str, values: &str) -> FieldMetadata {
    FieldMetadata {
        title: title.to_string(),
        data_type,
        range: range.to_string(),
        values: values.to_string(),
        ..Default::default()
    }
}

fn catalog() -> MetadataCatalog {
    MetadataCatalog::from_entries([
        ("id", field("Identifier", FieldType::String, "1..1", "")),
        ("name", field("Name", FieldType::String, "1..1", "")),
        ("category", field("Category", FieldType::String, "0..1", "Enum: a, b, c")),
        ("date", field("Date", FieldType::String, "0..1", "date")),
        ("amount", field("Amount", FieldType::Number, "0..1", "")),
        ("currency", field("Currency", FieldType::String, "0..1", "")),
        ("total", field("Total", FieldType::Number, "0..1", "")),
        ("tags", field("Tags", FieldType::Array, "0..n", "")),
        ("location/geometry", field("Geometry", FieldType::String, "0..1", "")),
        (
            "parties/roles",
            FieldMetadata {
                codelist: Some("partyRole.csv".to_string()),
                ..field("Roles", FieldType::Array, "0..n", "Codelist")
            },
        ),
        ("parties/id", field("Party ID", FieldType::String, "0..1", "")),
        ("links/href", field("Link", FieldType::String, "0..1", "uri")),
        ("links/rel", field("Relation", FieldType::String, "0..1", "")),
        ("links/title", field("Link title", FieldType::String, "0..1", "")),
    ])
}

fn resolve(config: &TemplateConfig, sheets: &[(&str, &[&str])]) -> ResolvedSheets {
    let flattened: FlattenedSheets = sheets
        .iter()
        .map(|(name, fields)| (*name, fields.to_vec()))
        .collect();
    FieldResolver::new(config).resolve(&flattened).unwrap()
}

async fn build(
    generator: &TemplateGenerator,
    config: &TemplateConfig,
    sheets: &[(&str, &[&str])],
) -> (MemoryWorkbook, LayoutReport) {
    let mut workbook = MemoryWorkbook::new();
    let resolved = resolve(config, sheets);
    let report = generator
        .build(&mut workbook, &catalog(), &resolved, config, None)
        .await
        .unwrap();
    (workbook, report)
}

/// Header stack, enumeration column and list validation for a small sheet
#[tokio::test]
async fn test_required_and_enumerated_columns() {
    let generator = TemplateGenerator::new().with_input_rows(3);
    let config = TemplateConfig::default();
    let (workbook, report) = build(&generator, &config, &[("main", &["name", "category"])]).await;

    assert_eq!(workbook.sheet_names(), vec!["# Enums", "Meta", "main"]);
    assert_eq!(report.sheets, vec!["main".to_string()]);
    assert_eq!(report.columns, 2);
    assert_eq!(report.enumeration_columns, 1);

    let main = workbook.sheet("main").unwrap();
    let labels: Vec<&str> = (0..8).filter_map(|row| main.text(row, 0)).collect();
    assert_eq!(
        labels,
        vec![
            "# path",
            "# title",
            "# description",
            "# required",
            "# type",
            "# values",
            "# codelist",
            "# input guidance",
        ]
    );
    assert_eq!(main.style(0, 0), Some(CellStyle::HeaderColumn));

    assert_eq!(main.text(0, 1), Some("name"));
    assert_eq!(main.text(1, 1), Some("Name"));
    assert_eq!(main.text(3, 1), Some("Required"));
    assert_eq!(main.text(4, 1), Some("string"));
    assert_eq!(main.style(8, 1), Some(CellStyle::Input(InputFormat::Text)));
    assert!(main.validation_at(8, 1).is_none());

    assert_eq!(main.text(5, 2), Some("Enum: a, b, c"));
    let expected = ValidationRule::List {
        source: "='# Enums'!$A$2:$A$4".to_string(),
        severity: ErrorSeverity::Stop,
        error_title: CODELIST_ERROR_TITLE.to_string(),
        error_message: EMBEDDED_SCALAR_MESSAGE.to_string(),
    };
    for row in 8..11 {
        assert_eq!(main.validation_at(row, 2), Some(&expected));
    }
    assert!(main.validation_at(11, 2).is_none());
    assert_eq!(main.frozen(), Some((1, 1)));

    let enums = workbook.sheet("# Enums").unwrap();
    let column: Vec<&str> = (0..4).filter_map(|row| enums.text(row, 0)).collect();
    assert_eq!(column, vec!["category", "a", "b", "c"]);
    assert!(enums.is_hidden());
    assert!(workbook.sheet("Meta").unwrap().is_hidden());
    assert_eq!(workbook.active_sheet(), Some("main"));
}

/// Date fields get a date format and an on-or-after rule
#[tokio::test]
async fn test_date_column() {
    let generator = TemplateGenerator::new().with_input_rows(2);
    let (workbook, _) = build(&generator, &TemplateConfig::default(), &[("main", &["id", "date"])]).await;

    let main = workbook.sheet("main").unwrap();
    assert_eq!(main.style(8, 2), Some(CellStyle::Input(InputFormat::Date)));
    assert_eq!(
        main.validation_at(9, 2),
        Some(&ValidationRule::DateOnOrAfter(
            NaiveDate::from_ymd_opt(1900, 1, 1).unwrap()
        ))
    );
}

/// Fixed values and formulae fill every input row
#[tokio::test]
async fn test_fixed_values_and_formulae() {
    let generator = TemplateGenerator::new().with_input_rows(2);
    let config = TemplateConfig::from_yaml_str(
        "fixed_values:\n  currency: GBP\nformulae:\n  total: \"=C{row}*2\"\n",
    )
    .unwrap();
    let (workbook, _) = build(
        &generator,
        &config,
        &[("main", &["id", "amount", "currency", "total"])],
    )
    .await;

    let main = workbook.sheet("main").unwrap();
    assert_eq!(
        main.value(8, 3),
        Some(&CellValue::Formula("=IF(B9=\"\",\"\",\"GBP\")".to_string()))
    );
    assert_eq!(
        main.value(9, 3),
        Some(&CellValue::Formula("=IF(B10=\"\",\"\",\"GBP\")".to_string()))
    );
    assert_eq!(main.value(8, 4), Some(&CellValue::Formula("=C9*2".to_string())));
    assert_eq!(main.value(9, 4), Some(&CellValue::Formula("=C10*2".to_string())));
    assert_eq!(main.style(8, 2), Some(CellStyle::Input(InputFormat::Number)));
}

/// The links sheet mirrors main-sheet identifiers and is hidden
#[tokio::test]
async fn test_links_sheet() {
    let generator = TemplateGenerator::new()
        .with_input_rows(2)
        .with_schema_url(Some("https://example.com/schema.json".to_string()));
    let (workbook, report) = build(
        &generator,
        &TemplateConfig::default(),
        &[
            ("main", &["id", "name"]),
            ("links", &["id", "links/0/href", "links/0/rel", "links/0/title"]),
        ],
    )
    .await;

    assert_eq!(report.sheets, vec!["main".to_string(), "links".to_string()]);
    let links = workbook.sheet("links").unwrap();
    assert!(links.is_hidden());
    assert_eq!(
        links.value(8, 1),
        Some(&CellValue::Formula("=IF(ISBLANK(main!B9),\"\",main!B9)".to_string()))
    );
    assert_eq!(
        links.value(8, 2),
        Some(&CellValue::Formula(
            "=IF(B9=\"\",\"\",\"https://example.com/schema.json\")".to_string()
        ))
    );
    assert_eq!(
        links.value(9, 3),
        Some(&CellValue::Formula("=IF(B10=\"\",\"\",\"describedby\")".to_string()))
    );
    assert!(!matches!(links.value(8, 4), Some(CellValue::Formula(_))));
    assert_eq!(links.style(8, 1), Some(CellStyle::Input(InputFormat::Unformatted)));
    assert!(!workbook.sheet("main").unwrap().is_hidden());
}

/// Building twice from the same inputs gives the same workbook
#[tokio::test]
async fn test_layout_is_deterministic() {
    let generator = TemplateGenerator::new().with_input_rows(4);
    let config = TemplateConfig::from_yaml_str("variables:\n  rate: 1.5\n").unwrap();
    let sheets: &[(&str, &[&str])] = &[
        ("main", &["id", "name", "category", "date"]),
        ("parties", &["id", "parties/0/id", "parties/0/roles"]),
    ];

    let (first, first_report) = build(&generator, &config, sheets).await;
    let (second, second_report) = build(&generator, &config, sheets).await;
    assert_eq!(first, second);
    assert_eq!(first_report, second_report);
}

/// Array and geometry guidance replace configured guidance
#[tokio::test]
async fn test_guidance_precedence() {
    let generator = TemplateGenerator::new().with_input_rows(1);
    let config = TemplateConfig::from_yaml_str(
        "field_guidance:\n  name: Use the legal name\n  tags: ignored\n  location/0/geometry: ignored\n",
    )
    .unwrap();
    let (workbook, _) = build(
        &generator,
        &config,
        &[("main", &["name", "tags", "location/0/geometry", "category"])],
    )
    .await;

    let main = workbook.sheet("main").unwrap();
    assert_eq!(main.text(7, 1), Some("Use the legal name"));
    assert_eq!(main.text(7, 2), Some(ARRAY_GUIDANCE));
    assert_eq!(main.text(7, 3), Some(WKT_GUIDANCE));
    assert_eq!(main.style(7, 1), Some(CellStyle::HeaderGuidance));

    let (workbook, _) = build(
        &generator.clone().with_wkt(false),
        &config,
        &[("main", &["location/0/geometry"])],
    )
    .await;
    assert_eq!(workbook.sheet("main").unwrap().text(7, 1), Some("ignored"));
}

/// Each list-validated column gets its own enumeration column, across sheets
#[tokio::test]
async fn test_enumeration_columns_across_sheets() {
    let generator = TemplateGenerator::new().with_input_rows(2);
    let codelists = StaticCodelists::new().with_codelist("partyRole.csv", ["buyer", "supplier"]);
    let config = TemplateConfig::default();
    let resolved = resolve(
        &config,
        &[
            ("main", &["id", "category"]),
            ("parties", &["id", "parties/0/id", "parties/0/roles"]),
            ("other", &["id", "category"]),
        ],
    );

    let mut workbook = MemoryWorkbook::new();
    let report = generator
        .build(&mut workbook, &catalog(), &resolved, &config, Some(&codelists))
        .await
        .unwrap();
    assert_eq!(report.enumeration_columns, 3);

    let parties = workbook.sheet("parties").unwrap();
    assert_eq!(
        parties.validation_at(8, 3),
        Some(&ValidationRule::List {
            source: "='# Enums'!$B$2:$B$3".to_string(),
            severity: ErrorSeverity::Warning,
            error_title: CODELIST_ERROR_TITLE.to_string(),
            error_message: FETCHED_ARRAY_MESSAGE.to_string(),
        })
    );
    assert_eq!(parties.text(7, 3), Some(CODED_ARRAY_GUIDANCE));
    assert_eq!(
        parties.value(6, 3),
        Some(&CellValue::Formula("=\"partyRole\"".to_string()))
    );

    let other = workbook.sheet("other").unwrap();
    assert!(matches!(
        other.validation_at(8, 2),
        Some(ValidationRule::List { source, .. }) if source == "='# Enums'!$C$2:$C$4"
    ));

    let enums = workbook.sheet("# Enums").unwrap();
    assert_eq!(enums.text(0, 1), Some("parties/0/roles"));
    assert_eq!(enums.text(2, 1), Some("supplier"));
    assert_eq!(enums.text(0, 2), Some("category"));
}

/// Codelist fields get no list without a codelist source
#[tokio::test]
async fn test_codelist_without_source() {
    let generator = TemplateGenerator::new().with_input_rows(1);
    let (workbook, report) = build(
        &generator,
        &TemplateConfig::default(),
        &[("parties", &["id", "parties/0/roles"])],
    )
    .await;
    assert_eq!(report.enumeration_columns, 0);
    assert!(workbook.sheet("parties").unwrap().validation_at(8, 2).is_none());
}

/// A field without metadata aborts the layout
#[tokio::test]
async fn test_missing_metadata() {
    let generator = TemplateGenerator::new().with_input_rows(1);
    let config = TemplateConfig::default();
    let resolved = resolve(&config, &[("main", &["id", "parties/0/unknown"])]);

    let mut workbook = MemoryWorkbook::new();
    let err = generator
        .build(&mut workbook, &catalog(), &resolved, &config, None)
        .await
        .unwrap_err();
    match err {
        TemplateError::MetadataMissing { path, key } => {
            assert_eq!(path, "parties/0/unknown");
            assert_eq!(key, "parties/unknown");
        }
        other => panic!("unexpected error: {other}"),
    }
}

/// Meta and variables sheets, defined names and tab order
#[tokio::test]
async fn test_meta_and_variables_sheets() {
    let generator = TemplateGenerator::new().with_input_rows(1);
    let config = TemplateConfig::from_yaml_str(
        "package_metadata:\n  publisher: Example\n  version: 2\nvariables:\n  rate: 1.5\n  region: North\n",
    )
    .unwrap();
    let (workbook, _) = build(&generator, &config, &[("main", &["id", "name"])]).await;

    assert_eq!(
        workbook.sheet_names(),
        vec!["# Enums", "Meta", "# Variables", "main"]
    );

    let meta = workbook.sheet("Meta").unwrap();
    assert_eq!(meta.text(0, 0), Some("#"));
    assert_eq!(meta.text(0, 1), Some("hashComments"));
    assert_eq!(meta.text(0, 2), Some("HeaderRows 8"));
    assert_eq!(meta.text(1, 0), Some("publisher"));
    assert_eq!(meta.text(1, 1), Some("Example"));
    assert_eq!(meta.text(2, 0), Some("version"));
    assert_eq!(meta.value(2, 1), Some(&CellValue::Number(2.0)));

    let variables = workbook.sheet("# Variables").unwrap();
    assert_eq!(variables.text(0, 0), Some("Name"));
    assert_eq!(variables.text(1, 0), Some("rate"));
    assert_eq!(variables.value(1, 1), Some(&CellValue::Number(1.5)));
    assert_eq!(
        workbook.defined_names().get("region").map(String::as_str),
        Some("='# Variables'!$B$3")
    );
    assert_eq!(workbook.defined_names().len(), 2);
}

/// Without a main sheet nothing is activated
#[tokio::test]
async fn test_missing_main_sheet() {
    let generator = TemplateGenerator::new()
        .with_input_rows(1)
        .with_main_sheet_name("root");
    let (workbook, report) = build(&generator, &TemplateConfig::default(), &[("main", &["id", "name"])]).await;
    assert_eq!(report.active_sheet, None);
    assert_eq!(workbook.active_sheet(), None);
}

/// Conflicting filters are rejected before any sheet is added
#[tokio::test]
async fn test_conflicting_filters_before_layout() {
    let generator = TemplateGenerator::new();
    let mut config = TemplateConfig::default();
    config.include_fields.push("id".into());
    config.exclude_fields.push("name".into());

    let mut workbook = MemoryWorkbook::new();
    let err = generator
        .build(
            &mut workbook,
            &catalog(),
            &ResolvedSheets::default(),
            &config,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::ConflictingFieldFilters));
    assert!(workbook.sheet_names().is_empty());
}

/// Configured scalars round-trip through fixed values as text
#[tokio::test]
async fn test_boolean_fixed_value() {
    let generator = TemplateGenerator::new().with_input_rows(1);
    let mut config = TemplateConfig::default();
    config
        .fixed_values
        .insert("name".into(), ScalarValue::Bool(true));
    let (workbook, _) = build(&generator, &config, &[("main", &["id", "name"])]).await;
    assert_eq!(
        workbook.sheet("main").unwrap().value(8, 2),
        Some(&CellValue::Formula("=IF(B9=\"\",\"\",\"TRUE\")".to_string()))
    );
}

/// A multi-valued enumerated field warns rather than rejects
#[tokio::test]
async fn test_array_enumeration_scenario() {
    let catalog = MetadataCatalog::from_entries([
        ("name", field("Name", FieldType::String, "1..1", "")),
        ("category", field("Category", FieldType::Array, "0..n", "Enum: a, b, c")),
    ]);
    let config = TemplateConfig::default();
    let resolved = resolve(&config, &[("main", &["name", "category"])]);

    let mut workbook = MemoryWorkbook::new();
    TemplateGenerator::new()
        .with_input_rows(3)
        .build(&mut workbook, &catalog, &resolved, &config, None)
        .await
        .unwrap();

    let main = workbook.sheet("main").unwrap();
    assert_eq!(main.text(3, 1), Some("Required"));
    assert!(main.validations().iter().all(|(range, _)| range.first_col == 2));
    match main.validation_at(8, 2) {
        Some(ValidationRule::List { source, severity, .. }) => {
            assert_eq!(source, "='# Enums'!$A$2:$A$4");
            assert_eq!(*severity, ErrorSeverity::Warning);
        }
        other => panic!("unexpected rule: {other:?}"),
    }
    assert_eq!(main.text(7, 2), Some(CODED_ARRAY_GUIDANCE));
}
