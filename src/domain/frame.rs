//! Photometry frame description and outputs.
//!
//! A frame bundles everything the aperture step needs besides the pixels:
//! the linear sky-to-pixel transform, detector gain, observation date and the
//! two stars being compared. It is read from JSON.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::photometry::{dms_to_degrees, hms_to_degrees};

/// Linear world-coordinate transform (one axis per sky coordinate).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearWcs {
    pub crpix1: f64,
    pub crval1: f64,
    pub cd1_1: f64,
    pub crpix2: f64,
    pub crval2: f64,
    pub cd2_2: f64,
}

/// Sky position in decimal degrees.
///
/// Frame files may give it either as `{"ra_deg": .., "dec_deg": ..}` or in
/// sexagesimal form as `{"ra_hms": [h, m, s], "dec_dms": [d, m, s]}`. A
/// southern declination carries its sign on the degrees field (`-0.0` when
/// the whole-degree part is zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SkyCoordinates")]
pub struct SkyPosition {
    pub ra_deg: f64,
    pub dec_deg: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkyCoordinates {
    Degrees { ra_deg: f64, dec_deg: f64 },
    Sexagesimal { ra_hms: [f64; 3], dec_dms: [f64; 3] },
}

impl From<SkyCoordinates> for SkyPosition {
    fn from(coords: SkyCoordinates) -> Self {
        match coords {
            SkyCoordinates::Degrees { ra_deg, dec_deg } => Self { ra_deg, dec_deg },
            SkyCoordinates::Sexagesimal {
                ra_hms: [h, m, s],
                dec_dms: [d, dm, ds],
            } => Self {
                ra_deg: hms_to_degrees(h, m, s),
                dec_deg: dms_to_degrees(d.is_sign_negative(), d, dm, ds),
            },
        }
    }
}

fn default_background_offset() -> i64 {
    47
}

fn default_half_width() -> usize {
    12
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotometryFrame {
    pub wcs: LinearWcs,
    /// Electrons per DN.
    pub gain: f64,
    /// Modified Julian Date of the exposure.
    pub mjd: f64,
    pub target: SkyPosition,
    pub reference: SkyPosition,
    /// Known magnitude of the reference star.
    pub reference_mag: f64,
    /// Diagonal pixel offset of the background box from the target.
    #[serde(default = "default_background_offset")]
    pub background_offset: i64,
    /// Apertures span `[c - half_width, c + half_width)` on both axes.
    #[serde(default = "default_half_width")]
    pub half_width: usize,
}

/// Which background statistic is subtracted from the apertures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundStat {
    Median,
    Mean,
}

/// Integer pixel position (column, row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelPosition {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BackgroundLevel {
    pub mean: f64,
    pub median: f64,
}

impl BackgroundLevel {
    pub fn select(&self, stat: BackgroundStat) -> f64 {
        match stat {
            BackgroundStat::Median => self.median,
            BackgroundStat::Mean => self.mean,
        }
    }
}

/// Background-subtracted electron count with Poisson error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApertureCount {
    pub electrons: f64,
    pub error: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelativeMagnitude {
    pub magnitude: f64,
    pub error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotometryReport {
    pub mjd: f64,
    pub target_pixel: PixelPosition,
    pub reference_pixel: PixelPosition,
    pub background: BackgroundLevel,
    pub background_stat: BackgroundStat,
    pub target: ApertureCount,
    pub reference: ApertureCount,
    pub magnitude: RelativeMagnitude,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_defaults_apply() {
        let json = r#"{
            "wcs": {"crpix1": 1.0, "crval1": 243.5, "cd1_1": -0.0001,
                    "crpix2": 1.0, "crval2": -19.1, "cd2_2": 0.0001},
            "gain": 1.2, "mjd": 57000.5,
            "target": {"ra_deg": 243.58, "dec_deg": -19.11},
            "reference": {"ra_deg": 243.59, "dec_deg": -19.10},
            "reference_mag": 13.5
        }"#;
        let frame: PhotometryFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.background_offset, 47);
        assert_eq!(frame.half_width, 12);
    }

    #[test]
    fn sexagesimal_positions_are_converted() {
        let json = r#"{
            "wcs": {"crpix1": 1.0, "crval1": 243.5, "cd1_1": -0.0001,
                    "crpix2": 1.0, "crval2": -19.1, "cd2_2": 0.0001},
            "gain": 1.2, "mjd": 57000.5,
            "target": {"ra_hms": [16, 14, 20.3], "dec_dms": [-19, 6, 48.1]},
            "reference": {"ra_hms": [16, 14, 20.912], "dec_dms": [-0.0, 30, 0]},
            "reference_mag": 13.5
        }"#;
        let frame: PhotometryFrame = serde_json::from_str(json).unwrap();
        assert!((frame.target.ra_deg - (16.0 * 15.0 + 14.0 / 4.0 + 20.3 / 240.0)).abs() < 1e-12);
        assert!((frame.target.dec_deg + (19.0 + 6.0 / 60.0 + 48.1 / 3600.0)).abs() < 1e-12);
        assert!((frame.reference.ra_deg - (16.0 * 15.0 + 14.0 / 4.0 + 20.912 / 240.0)).abs() < 1e-12);
        assert!((frame.reference.dec_deg + 0.5).abs() < 1e-12);
    }

    #[test]
    fn incomplete_position_is_rejected() {
        let json = r#"{"ra_hms": [16, 14, 20.3]}"#;
        assert!(serde_json::from_str::<SkyPosition>(json).is_err());
    }
}
