//! Command-line interface for template generation.

mod app;
pub mod commands;
mod types;

pub use app::TemplateApp;
pub use types::{CreateTemplateArgs, TemplateCli, TemplateCommand};

/// Main entry point for the CLI
///
/// # Errors
/// Returns error if CLI execution fails or encounters invalid arguments.
pub async fn run() -> schema_template_core::Result<()> {
    TemplateApp::from_args().run().await
}
