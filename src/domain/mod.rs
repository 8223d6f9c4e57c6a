//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - spectra and their normalized form (`SpectrumTable`, `NormalizedSpectrum`)
//! - line-fit parameters and outputs (`GaussianParams`, `FitResult`, `FluxMeasurement`)
//! - photometry frame inputs and outputs (`PhotometryFrame`, `ApertureCount`, ...)

pub mod frame;
pub mod types;

pub use frame::*;
pub use types::*;
