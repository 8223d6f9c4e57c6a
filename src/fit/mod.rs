//! Emission-line fitting.
//!
//! Responsibilities:
//!
//! - normalize spectra and place the line at its observed wavelength
//! - fit the Gaussian-plus-offset model
//! - derive the flux measurement and the exportable report

pub mod flux;
pub mod normalize;

pub use flux::*;
pub use normalize::*;
