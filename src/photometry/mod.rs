//! Aperture photometry of a target star against a reference star.
//!
//! Pipeline: sky position → pixel (linear WCS) → box apertures → background
//! subtraction → electrons → relative magnitude.

pub mod aperture;
pub mod wcs;

pub use aperture::*;
pub use wcs::*;
