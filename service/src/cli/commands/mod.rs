//! Command implementations

pub mod create_template;

pub use create_template::{CreateTemplateCommand, ResolvedOptions};
