//! `schema-template` CLI application.

use super::commands::CreateTemplateCommand;
use super::types::{TemplateCli, TemplateCommand};
use clap::Parser;
use schema_template_core::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Main `schema-template` CLI application
pub struct TemplateApp {
    cli: TemplateCli,
}

impl TemplateApp {
    /// Create the application from command line arguments
    #[must_use]
    pub fn from_args() -> Self {
        Self {
            cli: TemplateCli::parse(),
        }
    }

    /// Create the application with a custom CLI configuration
    #[must_use]
    pub fn new(cli: TemplateCli) -> Self {
        Self { cli }
    }

    /// Run the application
    ///
    /// # Errors
    ///
    /// Returns error if command execution fails.
    pub async fn run(self) -> Result<()> {
        self.init_logging();
        info!("Starting schema-template");

        match self.execute_command().await {
            Ok(()) => {
                info!("Command completed successfully");
                Ok(())
            }
            Err(err) => {
                error!(category = ?err.category(), "Command failed: {}", err);
                Err(err)
            }
        }
    }

    /// Configure tracing subscriber based on CLI flags; `RUST_LOG` wins when set
    fn init_logging(&self) {
        let level = if self.cli.quiet {
            tracing::Level::ERROR
        } else if self.cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        };

        let builder = tracing_subscriber::fmt()
            .with_target(false)
            .with_writer(std::io::stderr);
        let result = match EnvFilter::try_from_default_env() {
            Ok(filter) => builder.with_env_filter(filter).try_init(),
            Err(_) => builder.with_max_level(level).try_init(),
        };
        if let Err(err) = result {
            eprintln!("Failed to initialise logging: {err}");
        }
    }

    async fn execute_command(&self) -> Result<()> {
        match &self.cli.command {
            TemplateCommand::CreateTemplate(args) => {
                CreateTemplateCommand::new(args.clone())
                    .with_progress(!self.cli.quiet)
                    .with_verbose(self.cli.verbose)
                    .execute()
                    .await?;
                Ok(())
            }
        }
    }
}
