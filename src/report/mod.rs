//! Reporting utilities: formatted terminal output for fits and photometry.

pub mod format;

pub use format::*;
