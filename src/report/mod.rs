//! Reporting utilities: residuals and terminal summaries.

pub mod format;

pub use format::*;
