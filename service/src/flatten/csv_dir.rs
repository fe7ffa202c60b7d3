use super::{FlattenRequest, FlattenedSheets, Flattener};
use async_trait::async_trait;
use schema_template_core::{FieldPath, Result, TemplateError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Longest worksheet name a spreadsheet accepts
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Sheet name for a CSV file stem, truncated to [`MAX_SHEET_NAME_LEN`] characters
#[must_use]
pub fn sheet_name_from_stem(stem: &str) -> String {
    stem.chars().take(MAX_SHEET_NAME_LEN).collect()
}

/// Field paths in the first row of a CSV file
fn header_fields(path: &Path, content: &[u8]) -> Result<Vec<FieldPath>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    match reader.records().next() {
        Some(record) => {
            let record = record
                .map_err(|e| TemplateError::flatten(format!("{}: {e}", path.display())))?;
            Ok(record
                .iter()
                .filter(|field| !field.is_empty())
                .map(FieldPath::from)
                .collect())
        }
        None => Ok(Vec::new()),
    }
}

/// Read one header per `.csv` file in `directory`
///
/// Sheets are ordered by name with the main sheet first. A sheet name is
/// the file stem truncated to [`MAX_SHEET_NAME_LEN`] characters.
///
/// # Errors
///
/// Returns `TemplateError::FlattenError` if the directory cannot be listed,
/// a file cannot be read, or two files truncate to the same sheet name.
pub async fn read_sheet_headers(directory: &Path, main_sheet_name: &str) -> Result<FlattenedSheets> {
    let mut entries = fs::read_dir(directory)
        .await
        .map_err(|e| TemplateError::flatten(format!("{}: {e}", directory.display())))?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TemplateError::flatten(format!("{}: {e}", directory.display())))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let name = sheet_name_from_stem(stem);
        if let Some(previous) = seen.insert(name.clone(), path.clone()) {
            return Err(TemplateError::flatten(format!(
                "{} and {} both truncate to sheet name '{name}'",
                previous.display(),
                path.display()
            )));
        }
        files.push((name, path));
    }

    files.sort_by(|(a, _), (b, _)| {
        (a != main_sheet_name)
            .cmp(&(b != main_sheet_name))
            .then_with(|| a.cmp(b))
    });

    let mut sheets = FlattenedSheets::new();
    for (name, path) in files {
        let content = fs::read(&path)
            .await
            .map_err(|e| TemplateError::flatten(format!("{}: {e}", path.display())))?;
        let fields = header_fields(&path, &content)?;
        tracing::debug!(sheet = %name, fields = fields.len(), "read flattened header");
        sheets.insert(name, fields);
    }
    Ok(sheets)
}

/// Reads flattened headers from a directory of pre-generated CSV files
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    directory: PathBuf,
}

impl CsvDirectory {
    /// Read headers from `directory`
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl Flattener for CsvDirectory {
    async fn flatten(&self, request: &FlattenRequest) -> Result<FlattenedSheets> {
        read_sheet_headers(&self.directory, &request.main_sheet_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_sheet_name_truncation() {
        assert_eq!(sheet_name_from_stem("main"), "main");
        let long = "a".repeat(40);
        assert_eq!(sheet_name_from_stem(&long).chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[tokio::test]
    async fn test_reads_headers_main_first() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::write(dir.path().join("awards.csv"), "id,awards/0/id\n").expect("write");
        std::fs::write(dir.path().join("main.csv"), "id,title,date\n").expect("write");
        std::fs::write(dir.path().join("empty.csv"), "").expect("write");
        std::fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let sheets = read_sheet_headers(dir.path(), "main").await.expect("reads");
        assert_eq!(sheets.names().collect::<Vec<_>>(), vec!["main", "awards", "empty"]);
        assert_eq!(
            sheets.get("main").expect("main"),
            &[FieldPath::new("id"), FieldPath::new("title"), FieldPath::new("date")]
        );
        assert!(sheets.get("empty").expect("empty").is_empty());
    }

    #[tokio::test]
    async fn test_truncation_collision() {
        let dir = TempDir::new().expect("temp dir");
        let stem = "x".repeat(31);
        std::fs::write(dir.path().join(format!("{stem}a.csv")), "id\n").expect("write");
        std::fs::write(dir.path().join(format!("{stem}b.csv")), "id\n").expect("write");

        let err = read_sheet_headers(dir.path(), "main")
            .await
            .expect_err("names collide");
        assert!(matches!(err, TemplateError::FlattenError(_)));
    }
}
