use super::{MetadataCatalog, MetadataSource};
use async_trait::async_trait;
use schema_template_core::{FieldMetadata, FieldType, MetadataKey, Result, TemplateError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default mapping-sheet program
const OCDSKIT: &str = "ocdskit";

/// One row of a mapping sheet; columns not listed here are ignored
#[derive(Debug, Deserialize)]
struct MappingSheetRow {
    path: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "type")]
    data_type: String,
    #[serde(default)]
    range: String,
    #[serde(default)]
    values: String,
    #[serde(default)]
    codelist: String,
}

impl From<MappingSheetRow> for FieldMetadata {
    fn from(row: MappingSheetRow) -> Self {
        Self {
            title: row.title,
            description: row.description,
            data_type: FieldType::parse(&row.data_type),
            range: row.range,
            values: row.values,
            codelist: Some(row.codelist).filter(|codelist| !codelist.is_empty()),
        }
    }
}

/// Parse a mapping-sheet CSV into a catalog
///
/// Rows with an empty path are skipped; a repeated path keeps its last row.
///
/// # Errors
///
/// Returns `TemplateError::MetadataError` if the CSV cannot be read or has
/// no `path` column.
pub fn parse_mapping_sheet(content: &[u8]) -> Result<MetadataCatalog> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content);

    let mut catalog = MetadataCatalog::default();
    for row in reader.deserialize::<MappingSheetRow>() {
        let row = row.map_err(|e| TemplateError::metadata(format!("mapping sheet: {e}")))?;
        if row.path.is_empty() {
            continue;
        }
        let key = MetadataKey::new(&row.path);
        catalog.insert(key, row.into());
    }
    tracing::debug!(fields = catalog.len(), "parsed mapping sheet");
    Ok(catalog)
}

/// Reads field metadata from a mapping-sheet CSV file
#[derive(Debug, Clone)]
pub struct MappingSheetFile {
    path: PathBuf,
}

impl MappingSheetFile {
    /// Read metadata from `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl MetadataSource for MappingSheetFile {
    async fn load(&self, _schema_path: &Path) -> Result<MetadataCatalog> {
        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|e| TemplateError::metadata(format!("{}: {e}", self.path.display())))?;
        parse_mapping_sheet(&content)
    }
}

/// Produces a mapping sheet by running `ocdskit mapping-sheet --codelist`
#[derive(Debug, Clone)]
pub struct MappingSheetCommand {
    program: PathBuf,
}

impl MappingSheetCommand {
    /// Use `ocdskit` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(OCDSKIT)
    }

    /// Use a specific executable
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for MappingSheetCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetadataSource for MappingSheetCommand {
    async fn load(&self, schema_path: &Path) -> Result<MetadataCatalog> {
        tracing::info!(
            program = %self.program.display(),
            schema = %schema_path.display(),
            "reading field metadata"
        );
        let output = Command::new(&self.program)
            .args(["mapping-sheet", "--codelist"])
            .arg(schema_path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TemplateError::metadata(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            return Err(TemplateError::metadata(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_mapping_sheet(&output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schema_template_core::FieldPath;

    const MAPPING_SHEET: &str = "\
section,path,title,description,type,range,values,links,codelist,deprecated
,id,Identifier,A unique identifier,string,1..1,,,,
,parties/roles,Roles,\"The roles, in order\",array,0..n,Codelist,,partyRole.csv,
,date,Date,,string,0..1,date,,,
";

    #[test]
    fn test_parse_rows() {
        let catalog = parse_mapping_sheet(MAPPING_SHEET.as_bytes()).expect("parses");
        assert_eq!(catalog.len(), 3);

        let id = catalog.lookup(&FieldPath::new("id")).expect("id");
        assert!(id.required());
        assert_eq!(id.data_type, FieldType::String);
        assert_eq!(id.codelist, None);

        let roles = catalog
            .lookup(&FieldPath::new("parties/0/roles"))
            .expect("roles");
        assert_eq!(roles.description, "The roles, in order");
        assert_eq!(roles.data_type, FieldType::Array);
        assert_eq!(roles.codelist.as_deref(), Some("partyRole.csv"));

        assert!(catalog.lookup(&FieldPath::new("date")).expect("date").is_date());
    }

    #[test]
    fn test_missing_path_column() {
        let err = parse_mapping_sheet(b"title,type\nA,string\n").expect_err("no path column");
        assert!(matches!(err, TemplateError::MetadataError(_)));
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("mapping.csv");
        std::fs::write(&path, MAPPING_SHEET).expect("write");

        let catalog = MappingSheetFile::new(&path)
            .load(Path::new("schema.json"))
            .await
            .expect("loads");
        assert_eq!(catalog.len(), 3);
    }
}
