use super::csv_dir::read_sheet_headers;
use super::{FlattenRequest, FlattenedSheets, Flattener};
use crate::generator::TemplateFeatures;
use async_trait::async_trait;
use schema_template_core::{Result, TemplateError};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

/// Default flattening program
const FLATTEN_TOOL: &str = "flatten-tool";

/// Runs `flatten-tool create-template` into a temporary directory
///
/// The directory is removed when flattening finishes, whether or not it
/// succeeded.
#[derive(Debug, Clone)]
pub struct FlattenToolCommand {
    program: PathBuf,
}

impl FlattenToolCommand {
    /// Use `flatten-tool` from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(FLATTEN_TOOL)
    }

    /// Use a specific executable
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, request: &FlattenRequest, output_dir: &std::path::Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("create-template")
            .arg("--schema")
            .arg(&request.schema_path)
            .args(["--output-format", "csv", "--main-sheet-name"])
            .arg(&request.main_sheet_name)
            .arg("--output-name")
            .arg(output_dir)
            .arg("--truncation-length")
            .arg(request.truncation_length.to_string());
        if request.features.contains(TemplateFeatures::CONVERT_WKT) {
            command.arg("--convert-wkt");
        }
        if request.features.contains(TemplateFeatures::ROLLUP) {
            command.arg("--rollup");
        }
        command.kill_on_drop(true);
        command
    }
}

impl Default for FlattenToolCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Flattener for FlattenToolCommand {
    async fn flatten(&self, request: &FlattenRequest) -> Result<FlattenedSheets> {
        let workdir = tempfile::Builder::new()
            .prefix("schema-template-")
            .tempdir()?;
        let output_dir = workdir.path().join("flattened");

        info!(
            program = %self.program.display(),
            schema = %request.schema_path.display(),
            "flattening schema"
        );
        let output = self
            .command(request, &output_dir)
            .output()
            .await
            .map_err(|e| {
                TemplateError::flatten(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            return Err(TemplateError::flatten(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        debug!(output = %output_dir.display(), "flattening finished");

        read_sheet_headers(&output_dir, &request.main_sheet_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(features: TemplateFeatures) -> FlattenRequest {
        FlattenRequest {
            schema_path: PathBuf::from("schema.json"),
            main_sheet_name: "main".to_string(),
            truncation_length: 10,
            features,
        }
    }

    fn arguments(command: &Command) -> Vec<String> {
        command
            .as_std()
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_arguments() {
        let tool = FlattenToolCommand::new();
        let command = tool.command(
            &request(TemplateFeatures::CONVERT_WKT | TemplateFeatures::ROLLUP),
            std::path::Path::new("out"),
        );
        let args = arguments(&command);
        assert_eq!(args[0], "create-template");
        assert!(args.contains(&"--convert-wkt".to_string()));
        assert!(args.contains(&"--rollup".to_string()));
        assert!(args.windows(2).any(|pair| pair == ["--truncation-length", "10"]));
    }

    #[test]
    fn test_switches_off() {
        let tool = FlattenToolCommand::new();
        let command = tool.command(&request(TemplateFeatures::NONE), std::path::Path::new("out"));
        let args = arguments(&command);
        assert!(!args.contains(&"--convert-wkt".to_string()));
        assert!(!args.contains(&"--rollup".to_string()));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let tool = FlattenToolCommand::with_program("definitely-not-a-flatten-tool");
        let err = tool
            .flatten(&request(TemplateFeatures::NONE))
            .await
            .expect_err("program does not exist");
        assert!(matches!(err, TemplateError::FlattenError(_)));
    }
}
