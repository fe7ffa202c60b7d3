//! `schema-template` command-line interface
//!
//! Generates spreadsheet data-entry templates from JSON Schema files.

use schema_template_service::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    cli::run().await?;
    Ok(())
}
