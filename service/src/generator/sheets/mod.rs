//! Helper sheets written around the data sheets

mod enums;
mod meta;
mod variables;

pub(crate) use enums::write_enumeration_sheet;
pub use meta::META_SHEET_NAME;
pub(crate) use meta::write_meta_sheet;
pub use variables::VARIABLES_SHEET_NAME;
pub(crate) use variables::write_variables_sheet;
