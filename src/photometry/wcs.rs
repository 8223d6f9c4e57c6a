//! Sky-to-pixel conversion with a purely linear world-coordinate transform.
//!
//! Each axis is independent:
//!
//! ```text
//! pixel = CRPIX + (coord - CRVAL) / CD
//! ```
//!
//! truncated toward zero to an integer pixel index. Rotation terms (CD1_2,
//! CD2_1) and projection distortions are ignored; over a few arcminutes near
//! the reference pixel that is well below a pixel.

use crate::domain::{LinearWcs, PixelPosition, SkyPosition};
use crate::error::AppError;

/// Pixel indices beyond this are rejected rather than saturated into `i64`.
const MAX_PIXEL: f64 = 1.0e15;

impl LinearWcs {
    pub fn ra_to_pixel(&self, ra_deg: f64) -> Result<i64, AppError> {
        axis_to_pixel(ra_deg, self.crpix1, self.crval1, self.cd1_1, "RA")
    }

    pub fn dec_to_pixel(&self, dec_deg: f64) -> Result<i64, AppError> {
        axis_to_pixel(dec_deg, self.crpix2, self.crval2, self.cd2_2, "Dec")
    }

    pub fn sky_to_pixel(&self, pos: SkyPosition) -> Result<PixelPosition, AppError> {
        Ok(PixelPosition {
            x: self.ra_to_pixel(pos.ra_deg)?,
            y: self.dec_to_pixel(pos.dec_deg)?,
        })
    }
}

fn axis_to_pixel(coord: f64, crpix: f64, crval: f64, cd: f64, axis: &str) -> Result<i64, AppError> {
    let pixel = crpix + (coord - crval) / cd;
    if !pixel.is_finite() {
        return Err(AppError::photometry(format!(
            "{axis} {coord} does not map to a finite pixel (CD={cd})."
        )));
    }
    if pixel.abs() >= MAX_PIXEL {
        return Err(AppError::photometry(format!(
            "{axis} {coord} maps to pixel {pixel:e}, outside any image (CD={cd})."
        )));
    }
    Ok(pixel.trunc() as i64)
}

/// Right ascension `h m s` to decimal degrees (`15h + m/4 + s/240`).
pub fn hms_to_degrees(hours: f64, minutes: f64, seconds: f64) -> f64 {
    hours * 15.0 + minutes / 4.0 + seconds / 240.0
}

/// Declination `d m s` to decimal degrees; `negative` applies to the whole angle.
pub fn dms_to_degrees(negative: bool, degrees: f64, minutes: f64, seconds: f64) -> f64 {
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    if negative { -magnitude } else { magnitude }
}
