//! Template layout engine.
//!
//! [`TemplateGenerator`] lays resolved sheets out on a [`WorkbookBackend`]:
//! each field becomes a column with a fixed stack of header rows, typed
//! input cells and an optional validation rule. Helper sheets hold the
//! enumeration lists, variables and the configuration read back when the
//! template is flattened again.
//!
//! [`WorkbookBackend`]: crate::backend::WorkbookBackend

pub(crate) mod cast;
mod column;
mod features;
mod header;
mod layout;
pub mod reference;
mod sheets;

pub use column::LINKS_SHEET_NAME;
pub use features::TemplateFeatures;
pub use header::{HEADER_ROW_COUNT, HeaderRow};
pub use layout::{LayoutReport, TemplateGenerator};
pub use sheets::{META_SHEET_NAME, VARIABLES_SHEET_NAME};
