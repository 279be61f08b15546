//! Export core modules shared across the CLI and desktop wrappers.

#[cfg(feature = "excel")]
pub mod excel_core;
