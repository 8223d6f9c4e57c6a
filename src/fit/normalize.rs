//! Intensity normalization and redshift helpers.

use crate::domain::{NormalizedSpectrum, SpectrumTable};
use crate::error::AppError;
use crate::math::min_max;

/// Rescale intensities so that `min(raw) → 0` and `max(raw) → 1`.
///
/// Fails with a degenerate-normalization error when every intensity is equal
/// (or no intensity is finite), since the rescaling would divide by zero.
pub fn normalize(table: &SpectrumTable) -> Result<NormalizedSpectrum, AppError> {
    let raw = table.intensities();
    let Some((lo, hi)) = min_max(&raw) else {
        return Err(AppError::degenerate("Spectrum has no finite intensities to normalize."));
    };
    let range = hi - lo;
    if !(range > 0.0) {
        return Err(AppError::degenerate(format!(
            "All {} intensities equal {lo}; normalization has zero dynamic range.",
            raw.len()
        )));
    }

    Ok(NormalizedSpectrum {
        wavelengths: table.wavelengths(),
        intensities: raw.iter().map(|v| (v - lo) / range).collect(),
        raw_min: lo,
        raw_range: range,
    })
}

/// Observed-frame wavelength of a line: `lambda_rest * (1 + z)`.
pub fn observed_wavelength(lambda_rest: f64, z: f64) -> f64 {
    lambda_rest * (1.0 + z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn normalized_range_is_unit_interval() {
        let table = SpectrumTable::from_columns(&[1.0, 2.0, 3.0, 4.0, 5.0], &[3.0, -1.0, 7.0, 2.5, 0.0]);
        let n = normalize(&table).unwrap();
        let min = n.intensities.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = n.intensities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
        assert_eq!(n.raw_min, -1.0);
        assert_eq!(n.raw_range, 8.0);
        assert!((n.intensities[0] - 0.5).abs() < 1e-15);
        assert_eq!(n.wavelengths, table.wavelengths());
    }

    #[test]
    fn flat_spectrum_is_degenerate() {
        let table = SpectrumTable::from_columns(&[1.0, 2.0, 3.0, 4.0], &[2.0; 4]);
        let err = normalize(&table).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateNormalization);
    }

    #[test]
    fn redshift_composition() {
        for &z in &[0.0, 0.28, 1.5, 7.0] {
            assert_eq!(observed_wavelength(6563.0, z), 6563.0 * (1.0 + z));
        }
        assert_eq!(observed_wavelength(6563.0, 0.0), 6563.0);
    }
}
