//! Mathematical utilities: nonlinear least squares and descriptive statistics.

pub mod lm;
pub mod stats;

pub use lm::*;
pub use stats::*;
